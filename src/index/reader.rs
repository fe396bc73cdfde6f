//! Read access to an indexed numeric segment.

use std::io::{Read, Write};
use std::sync::Arc;

use ahash::AHashMap;
use bit_vec::BitVec;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::dictionary::MemoryTermDictionary;
use crate::error::{Result, TrievalError};
use crate::field::NumericField;
use crate::terms::Terms;

/// Per-document liveness for a segment (bit set = deleted).
///
/// The query layer treats this as an opaque filter: matched documents are
/// checked against it once when terms are converted to documents.
#[derive(Debug, Clone)]
pub struct LiveDocs {
    deleted_docs: BitVec,
    deleted_count: u32,
}

impl LiveDocs {
    /// Create a bitmap for `max_doc` documents, all live.
    pub fn new(max_doc: u32) -> Self {
        LiveDocs {
            deleted_docs: BitVec::from_elem(max_doc as usize, false),
            deleted_count: 0,
        }
    }

    /// Mark a document as deleted. Returns `true` if it was live before.
    pub fn delete(&mut self, doc_id: u32) -> bool {
        let index = doc_id as usize;
        if index >= self.deleted_docs.len() {
            return false;
        }
        let was_deleted = self.deleted_docs.get(index).unwrap_or(false);
        if !was_deleted {
            self.deleted_docs.set(index, true);
            self.deleted_count += 1;
        }
        !was_deleted
    }

    /// Check whether a document is live. Ids beyond the segment are dead.
    pub fn is_live(&self, doc_id: u32) -> bool {
        let index = doc_id as usize;
        index < self.deleted_docs.len() && !self.deleted_docs.get(index).unwrap_or(true)
    }

    /// Number of deleted documents.
    pub fn deleted_count(&self) -> u32 {
        self.deleted_count
    }

    /// Whether any document is deleted.
    pub fn has_deletions(&self) -> bool {
        self.deleted_count > 0
    }
}

/// Serialized segment header: field configurations and liveness, as JSON.
#[derive(Debug, Serialize, Deserialize)]
struct SegmentMeta {
    max_doc: u32,
    fields: Vec<(String, NumericField)>,
    deleted_docs: Vec<u32>,
}

/// An immutable view over one indexed segment: per-field term dictionaries,
/// the document count, and the liveness filter.
#[derive(Debug, Clone)]
pub struct NumericIndexReader {
    fields: AHashMap<String, (NumericField, Arc<MemoryTermDictionary>)>,
    max_doc: u32,
    live_docs: Option<Arc<LiveDocs>>,
}

impl NumericIndexReader {
    pub(crate) fn new(
        fields: AHashMap<String, (NumericField, Arc<MemoryTermDictionary>)>,
        max_doc: u32,
        live_docs: Option<Arc<LiveDocs>>,
    ) -> Self {
        NumericIndexReader {
            fields,
            max_doc,
            live_docs,
        }
    }

    /// The term dictionary of a field, or `None` for unknown fields.
    pub fn terms(&self, field: &str) -> Option<&dyn Terms> {
        self.fields
            .get(field)
            .map(|(_, dictionary)| dictionary.as_ref() as &dyn Terms)
    }

    /// The configuration of a field, or `None` for unknown fields.
    pub fn field(&self, name: &str) -> Option<&NumericField> {
        self.fields.get(name).map(|(field, _)| field)
    }

    /// Iterate the indexed fields and their configurations.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &NumericField)> {
        self.fields
            .iter()
            .map(|(name, (field, _))| (name.as_str(), field))
    }

    /// One past the highest assigned document id.
    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Number of live documents.
    pub fn doc_count(&self) -> u32 {
        let deleted = self.live_docs.as_ref().map_or(0, |live| live.deleted_count());
        self.max_doc - deleted
    }

    /// The liveness filter, present only when the segment has deletions.
    pub fn live_docs(&self) -> Option<&Arc<LiveDocs>> {
        self.live_docs.as_ref()
    }

    /// Whether the segment has deleted documents.
    pub fn has_deletions(&self) -> bool {
        self.live_docs.is_some()
    }

    /// Persist the segment: a JSON header with field configurations and
    /// liveness, followed by each field's dictionary in header order.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut field_names: Vec<&String> = self.fields.keys().collect();
        field_names.sort();

        let meta = SegmentMeta {
            max_doc: self.max_doc,
            fields: field_names
                .iter()
                .map(|name| ((*name).clone(), self.fields[*name].0))
                .collect(),
            deleted_docs: match &self.live_docs {
                Some(live) => (0..self.max_doc).filter(|&doc| !live.is_live(doc)).collect(),
                None => Vec::new(),
            },
        };
        let header = serde_json::to_vec(&meta)?;
        writer.write_u32::<LittleEndian>(header.len() as u32)?;
        writer.write_all(&header)?;

        for name in field_names {
            self.fields[name].1.write_to(writer)?;
        }
        Ok(())
    }

    /// Read a segment written by [`NumericIndexReader::write_to`].
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let header_len = reader.read_u32::<LittleEndian>()? as usize;
        let mut header = vec![0u8; header_len];
        reader.read_exact(&mut header)?;
        let meta: SegmentMeta = serde_json::from_slice(&header)?;

        let mut fields = AHashMap::with_capacity(meta.fields.len());
        for (name, field) in meta.fields {
            let dictionary = MemoryTermDictionary::read_from(reader)?;
            fields.insert(name, (field, Arc::new(dictionary)));
        }

        let live_docs = if meta.deleted_docs.is_empty() {
            None
        } else {
            let mut live = LiveDocs::new(meta.max_doc);
            for doc in meta.deleted_docs {
                if doc >= meta.max_doc {
                    return Err(TrievalError::decoding(format!(
                        "deleted doc id {doc} out of range for segment of {}",
                        meta.max_doc
                    )));
                }
                live.delete(doc);
            }
            Some(Arc::new(live))
        };

        Ok(NumericIndexReader::new(fields, meta.max_doc, live_docs))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::index::writer::NumericIndexWriter;
    use crate::numeric::NumericValue;

    fn sample_reader() -> NumericIndexReader {
        let mut writer = NumericIndexWriter::new();
        writer.add_field("price", NumericField::i32()).unwrap();
        writer.add_field("weight", NumericField::f64()).unwrap();
        for i in 0..10 {
            writer
                .add_document(&[
                    ("price", NumericValue::I32(100 + i)),
                    ("weight", NumericValue::F64(f64::from(i) * 0.5)),
                ])
                .unwrap();
        }
        writer.delete_document(3).unwrap();
        writer.delete_document(7).unwrap();
        writer.commit().unwrap()
    }

    #[test]
    fn test_live_docs() {
        let mut live = LiveDocs::new(5);
        assert!(live.is_live(0));
        assert!(!live.is_live(5)); // out of range

        assert!(live.delete(2));
        assert!(!live.delete(2));
        assert!(!live.is_live(2));
        assert_eq!(live.deleted_count(), 1);
        assert!(live.has_deletions());

        assert!(!live.delete(99));
        assert_eq!(live.deleted_count(), 1);
    }

    #[test]
    fn test_reader_view() {
        let reader = sample_reader();
        assert_eq!(reader.max_doc(), 10);
        assert_eq!(reader.doc_count(), 8);
        assert!(reader.has_deletions());
        assert!(reader.terms("price").is_some());
        assert!(reader.terms("missing").is_none());
        assert_eq!(reader.field("weight").unwrap().numeric_type().value_bits(), 64);

        let live = reader.live_docs().unwrap();
        assert!(!live.is_live(3));
        assert!(live.is_live(4));
    }

    #[test]
    fn test_segment_persistence_round_trip() {
        let reader = sample_reader();
        let mut buf = Vec::new();
        reader.write_to(&mut buf).unwrap();

        let back = NumericIndexReader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back.max_doc(), reader.max_doc());
        assert_eq!(back.doc_count(), reader.doc_count());
        assert_eq!(back.field("price"), reader.field("price"));

        let terms = back.terms("price").unwrap();
        assert_eq!(terms.size(), reader.terms("price").unwrap().size());
        assert!(!back.live_docs().unwrap().is_live(7));
        assert!(back.live_docs().unwrap().is_live(0));
    }

    #[test]
    fn test_persistence_without_deletions_keeps_no_live_docs() {
        let mut writer = NumericIndexWriter::new();
        writer.add_field("n", NumericField::i32()).unwrap();
        writer.add_document(&[("n", NumericValue::I32(1))]).unwrap();
        let reader = writer.commit().unwrap();

        let mut buf = Vec::new();
        reader.write_to(&mut buf).unwrap();
        let back = NumericIndexReader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert!(back.live_docs().is_none());
    }
}
