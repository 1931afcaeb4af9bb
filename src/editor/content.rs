use tracing::debug;

use super::error::{EditError, check_index};
use super::navigate::is_leading_path;
use super::styles::split_children;
use super::tree::{Document, Paragraph, char_len, char_to_byte_idx, normalize_paragraph};
use super::{Change, DocumentVector, Edit};

impl Document {
    pub fn insert_text(
        &mut self,
        text: &str,
        vector: &DocumentVector,
    ) -> Result<DocumentVector, EditError> {
        let content = self.text_mut(vector)?;
        check_index(vector, 0, char_len(content))?;
        let byte_idx = char_to_byte_idx(content, vector.index);
        content.insert_str(byte_idx, text);

        let result = vector.with_index(vector.index + char_len(text));
        debug!(at = %vector, to = %result, "insert text");
        Ok(result)
    }

    /// Backspace at `vector`.
    pub fn delete_single(&mut self, vector: &DocumentVector) -> Result<Edit, EditError> {
        self.text_len_checked(vector)?;

        if vector.index == 0 {
            if is_leading_path(&vector.path) {
                return self.merge_paragraph(vector);
            }
            // same caret location as the end of the preceding leaf
            let previous = self.previous_vector(vector)?;
            return self.delete_single(&previous);
        }

        let caret = self.previous_vector(vector)?;
        let content = self.text_mut(vector)?;
        let start = char_to_byte_idx(content, vector.index - 1);
        let end = char_to_byte_idx(content, vector.index);
        content.replace_range(start..end, "");

        if !content.is_empty() {
            debug!(at = %vector, to = %caret, "delete character");
            return Ok(Edit::new(caret, Change::Subtree(vector.path.clone())));
        }

        let paragraph_index = vector.path[0];
        let caret = self.normalize_paragraph_at(paragraph_index, &caret)?;
        debug!(at = %vector, to = %caret, "delete character, purge emptied leaf");
        Ok(Edit::new(caret, Change::Subtree(vec![paragraph_index])))
    }

    /// Joins the paragraph at `vector.path[0]` onto the one before it. A no-op
    /// on the first paragraph.
    pub(crate) fn merge_paragraph(&mut self, vector: &DocumentVector) -> Result<Edit, EditError> {
        check_index(vector, 0, 0)?;
        self.resolve_text(vector)?;

        let paragraph_index = vector.path[0];
        if paragraph_index == 0 {
            return Ok(Edit::new(vector.clone(), Change::None));
        }

        let caret = self.trailing_vector(&[paragraph_index - 1])?;
        let removed = self.paragraphs.remove(paragraph_index);
        self.paragraphs[paragraph_index - 1]
            .children
            .extend(removed.children);
        let caret = self.normalize_paragraph_at(paragraph_index - 1, &caret)?;

        debug!(at = %vector, to = %caret, "merge paragraph");
        Ok(Edit::new(caret, Change::Document))
    }

    /// Splits the paragraph at `vector`. Everything after the caret, formats
    /// included, moves to a new paragraph inserted right after.
    pub fn insert_paragraph_break(
        &mut self,
        vector: &DocumentVector,
    ) -> Result<DocumentVector, EditError> {
        self.text_len_checked(vector)?;

        let paragraph_index = vector.path[0];
        let (left, right) = split_children(
            &self.paragraphs[paragraph_index].children,
            &vector.path[1..],
            vector.index,
        )?;
        let (left, _) = normalize_paragraph(left, None);
        let (right, _) = normalize_paragraph(right, None);

        self.paragraphs[paragraph_index].children = left;
        self.paragraphs
            .insert(paragraph_index + 1, Paragraph::new(right));

        let caret = self.leading_vector(&[paragraph_index + 1])?;
        debug!(at = %vector, to = %caret, "insert paragraph break");
        Ok(caret)
    }
}
