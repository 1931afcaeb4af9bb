//! Structured rich-text documents: a paragraph/format/text tree, caret
//! navigation over it and the mutations a text box needs, plus a terminal
//! renderer and `tdoc` export.

pub mod editor;
pub mod export;
pub mod render;
