//! Building an indexed numeric segment.

use std::collections::BTreeSet;
use std::sync::Arc;

use ahash::AHashMap;

use crate::dictionary::TermDictionaryBuilder;
use crate::error::{Result, TrievalError};
use crate::field::NumericField;
use crate::index::reader::{LiveDocs, NumericIndexReader};
use crate::numeric::NumericValue;

#[derive(Debug)]
struct FieldState {
    field: NumericField,
    builder: TermDictionaryBuilder,
}

/// Accumulates documents into per-field term dictionaries and produces an
/// immutable [`NumericIndexReader`] on commit.
///
/// Fields are declared up front; every value is type-checked against its
/// field and indexed at all trie levels of the field's precision step.
#[derive(Debug, Default)]
pub struct NumericIndexWriter {
    fields: AHashMap<String, FieldState>,
    max_doc: u32,
    deleted: BTreeSet<u32>,
}

impl NumericIndexWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        NumericIndexWriter {
            fields: AHashMap::new(),
            max_doc: 0,
            deleted: BTreeSet::new(),
        }
    }

    /// Declare a field. Fails if the name is already taken.
    pub fn add_field(&mut self, name: impl Into<String>, field: NumericField) -> Result<()> {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return Err(TrievalError::index(format!("field '{name}' already defined")));
        }
        self.fields.insert(
            name,
            FieldState {
                field,
                builder: TermDictionaryBuilder::new(),
            },
        );
        Ok(())
    }

    /// Add a document and return its assigned id.
    ///
    /// A field may appear more than once for multi-valued documents. Every
    /// named field must be declared and every value must match its field's
    /// type; on error the document is not added.
    pub fn add_document(&mut self, values: &[(&str, NumericValue)]) -> Result<u32> {
        // Generate all terms before touching the builders, so a bad value
        // cannot leave a half-indexed document behind.
        let mut terms_per_field: Vec<(&str, Vec<Vec<u8>>)> = Vec::with_capacity(values.len());
        for (name, value) in values {
            let state = self
                .fields
                .get(*name)
                .ok_or_else(|| TrievalError::index(format!("unknown field '{name}'")))?;
            terms_per_field.push((name, state.field.index_terms(*value)?));
        }

        let doc_id = self.max_doc;
        for (name, terms) in terms_per_field {
            if let Some(state) = self.fields.get_mut(name) {
                for term in terms {
                    state.builder.add_term(term, doc_id);
                }
            }
        }
        self.max_doc += 1;
        Ok(doc_id)
    }

    /// Mark a document as deleted. Returns `true` if it was live before.
    pub fn delete_document(&mut self, doc_id: u32) -> Result<bool> {
        if doc_id >= self.max_doc {
            return Err(TrievalError::index(format!(
                "doc id {doc_id} out of range, segment has {} documents",
                self.max_doc
            )));
        }
        Ok(self.deleted.insert(doc_id))
    }

    /// One past the highest assigned document id.
    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Freeze the accumulated state into a reader.
    pub fn commit(self) -> Result<NumericIndexReader> {
        let mut fields = AHashMap::with_capacity(self.fields.len());
        for (name, state) in self.fields {
            fields.insert(name, (state.field, Arc::new(state.builder.build())));
        }

        let live_docs = if self.deleted.is_empty() {
            None
        } else {
            let mut live = LiveDocs::new(self.max_doc);
            for doc in self.deleted {
                live.delete(doc);
            }
            Some(Arc::new(live))
        };

        Ok(NumericIndexReader::new(fields, self.max_doc, live_docs))
    }
}
