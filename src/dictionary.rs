//! In-memory term dictionary for prefix-coded numeric terms.
//!
//! A [`TermDictionaryBuilder`] accumulates terms and postings during
//! indexing; [`MemoryTermDictionary`] is the sorted, immutable result the
//! query layer reads through the [`Terms`] trait. The dictionary also
//! persists to a checksummed binary stream, so segment data survives a
//! process restart.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;

use crate::error::{Result, TrievalError};
use crate::terms::{PostingIterator, TermStats, Terms, TermsEnum, VecPostingIterator};
use crate::util::varint;

/// Magic number identifying a persisted term dictionary ("NTDC").
const DICTIONARY_MAGIC: u32 = 0x4E54_4443;

/// Current persistence format version.
const DICTIONARY_VERSION: u32 = 1;

/// A term's posting list and occurrence count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    /// Documents containing the term, sorted, without duplicates.
    pub postings: Vec<u32>,
    /// Total number of occurrences across all documents.
    pub total_term_freq: u64,
}

impl TermEntry {
    /// Number of documents containing the term.
    pub fn doc_freq(&self) -> u64 {
        self.postings.len() as u64
    }
}

/// Aggregate statistics over a dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryStats {
    /// Number of unique terms.
    pub term_count: u64,
    /// Sum of document frequencies across all terms.
    pub sum_doc_freq: u64,
    /// Sum of total term frequencies across all terms.
    pub sum_total_term_freq: u64,
}

/// Accumulates terms and postings during indexing.
#[derive(Debug, Default)]
pub struct TermDictionaryBuilder {
    terms: BTreeMap<Vec<u8>, TermEntry>,
}

impl TermDictionaryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        TermDictionaryBuilder {
            terms: BTreeMap::new(),
        }
    }

    /// Record one occurrence of `term` in document `doc_id`.
    ///
    /// Repeated occurrences in the same document raise the term frequency
    /// but keep the posting list duplicate-free.
    pub fn add_term(&mut self, term: Vec<u8>, doc_id: u32) {
        let entry = self.terms.entry(term).or_insert_with(|| TermEntry {
            postings: Vec::new(),
            total_term_freq: 0,
        });
        entry.total_term_freq += 1;
        match entry.postings.last() {
            Some(&last) if last == doc_id => {}
            Some(&last) if last > doc_id => {
                let pos = entry.postings.partition_point(|&doc| doc < doc_id);
                if entry.postings.get(pos) != Some(&doc_id) {
                    entry.postings.insert(pos, doc_id);
                }
            }
            _ => entry.postings.push(doc_id),
        }
    }

    /// Number of unique terms accumulated so far.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if no terms were added.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Finish building and produce the immutable dictionary.
    pub fn build(self) -> MemoryTermDictionary {
        let mut terms = Vec::with_capacity(self.terms.len());
        let mut entries = Vec::with_capacity(self.terms.len());
        for (term, entry) in self.terms {
            terms.push(term);
            entries.push(entry);
        }
        MemoryTermDictionary::from_parts(terms, entries)
    }
}

/// A sorted, immutable in-memory term dictionary.
#[derive(Debug, Clone)]
pub struct MemoryTermDictionary {
    /// Sorted terms.
    terms: Vec<Vec<u8>>,
    /// Entry for each term (parallel array).
    entries: Vec<TermEntry>,
    sum_doc_freq: u64,
    sum_total_term_freq: u64,
}

impl MemoryTermDictionary {
    fn from_parts(terms: Vec<Vec<u8>>, entries: Vec<TermEntry>) -> Self {
        let sum_doc_freq = entries.iter().map(|e| e.doc_freq()).sum();
        let sum_total_term_freq = entries.iter().map(|e| e.total_term_freq).sum();
        MemoryTermDictionary {
            terms,
            entries,
            sum_doc_freq,
            sum_total_term_freq,
        }
    }

    /// Number of unique terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if the dictionary holds no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Look up a term's entry.
    pub fn get(&self, term: &[u8]) -> Option<&TermEntry> {
        match self.terms.binary_search_by(|probe| probe.as_slice().cmp(term)) {
            Ok(index) => Some(&self.entries[index]),
            Err(_) => None,
        }
    }

    /// Iterate all terms in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &TermEntry)> {
        self.terms
            .iter()
            .zip(self.entries.iter())
            .map(|(term, entry)| (term.as_slice(), entry))
    }

    /// Aggregate statistics.
    pub fn stats(&self) -> DictionaryStats {
        DictionaryStats {
            term_count: self.terms.len() as u64,
            sum_doc_freq: self.sum_doc_freq,
            sum_total_term_freq: self.sum_total_term_freq,
        }
    }

    /// Write the dictionary to a stream.
    ///
    /// Layout: magic, version, payload length, payload, CRC32 of the
    /// payload. The payload holds a term count followed by each term's
    /// bytes, frequency, and delta-coded posting list, all varint-framed.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut payload = Vec::new();
        varint::write_u64(&mut payload, self.terms.len() as u64)?;
        for (term, entry) in self.iter() {
            varint::write_u32(&mut payload, term.len() as u32)?;
            payload.extend_from_slice(term);
            varint::write_u64(&mut payload, entry.total_term_freq)?;
            varint::write_u32(&mut payload, entry.postings.len() as u32)?;
            let mut previous = 0u32;
            for (i, &doc) in entry.postings.iter().enumerate() {
                let delta = if i == 0 { doc } else { doc - previous };
                varint::write_u32(&mut payload, delta)?;
                previous = doc;
            }
        }

        let mut hasher = Hasher::new();
        hasher.update(&payload);

        writer.write_u32::<LittleEndian>(DICTIONARY_MAGIC)?;
        writer.write_u32::<LittleEndian>(DICTIONARY_VERSION)?;
        writer.write_u64::<LittleEndian>(payload.len() as u64)?;
        writer.write_all(&payload)?;
        writer.write_u32::<LittleEndian>(hasher.finalize())?;
        Ok(())
    }

    /// Read a dictionary written by [`MemoryTermDictionary::write_to`].
    ///
    /// Verifies the magic, version, and checksum, and that terms arrive in
    /// strict sorted order; any disagreement is a decoding error.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != DICTIONARY_MAGIC {
            return Err(TrievalError::decoding("invalid term dictionary magic number"));
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != DICTIONARY_VERSION {
            return Err(TrievalError::decoding(format!(
                "unsupported term dictionary version: {version}"
            )));
        }

        let payload_len = reader.read_u64::<LittleEndian>()? as usize;
        let mut payload = vec![0u8; payload_len];
        reader.read_exact(&mut payload)?;
        let expected_crc = reader.read_u32::<LittleEndian>()?;
        let mut hasher = Hasher::new();
        hasher.update(&payload);
        if hasher.finalize() != expected_crc {
            return Err(TrievalError::decoding("term dictionary checksum mismatch"));
        }

        let mut cursor = Cursor::new(payload);
        let term_count = varint::read_u64(&mut cursor)? as usize;
        let mut terms: Vec<Vec<u8>> = Vec::with_capacity(term_count);
        let mut entries = Vec::with_capacity(term_count);
        for _ in 0..term_count {
            let term_len = varint::read_u32(&mut cursor)? as usize;
            let mut term = vec![0u8; term_len];
            cursor.read_exact(&mut term)?;
            if let Some(previous) = terms.last()
                && previous.as_slice() >= term.as_slice()
            {
                return Err(TrievalError::decoding("term dictionary terms out of order"));
            }

            let total_term_freq = varint::read_u64(&mut cursor)?;
            let posting_count = varint::read_u32(&mut cursor)? as usize;
            let mut postings = Vec::with_capacity(posting_count);
            let mut doc = 0u32;
            for i in 0..posting_count {
                let delta = varint::read_u32(&mut cursor)?;
                if i == 0 {
                    doc = delta;
                } else {
                    if delta == 0 {
                        return Err(TrievalError::decoding("duplicate doc id in posting list"));
                    }
                    doc = doc.checked_add(delta).ok_or_else(|| {
                        TrievalError::decoding("doc id overflow in posting list")
                    })?;
                }
                postings.push(doc);
            }

            terms.push(term);
            entries.push(TermEntry {
                postings,
                total_term_freq,
            });
        }

        Ok(MemoryTermDictionary::from_parts(terms, entries))
    }
}

impl Terms for MemoryTermDictionary {
    fn iterator(&self) -> Result<Box<dyn TermsEnum>> {
        let stats = self
            .iter()
            .map(|(term, entry)| TermStats {
                term: term.to_vec(),
                doc_freq: entry.doc_freq(),
                total_term_freq: entry.total_term_freq,
            })
            .collect();
        Ok(Box::new(MemoryTermsEnum::new(stats)))
    }

    fn size(&self) -> Option<u64> {
        Some(self.terms.len() as u64)
    }

    fn sum_doc_freq(&self) -> Option<u64> {
        Some(self.sum_doc_freq)
    }

    fn sum_total_term_freq(&self) -> Option<u64> {
        Some(self.sum_total_term_freq)
    }

    fn postings(&self, term: &[u8]) -> Result<Option<Box<dyn PostingIterator>>> {
        Ok(self
            .get(term)
            .map(|entry| Box::new(VecPostingIterator::new(entry.postings.clone())) as Box<dyn PostingIterator>))
    }
}

/// Iterator over a dictionary's terms.
pub struct MemoryTermsEnum {
    terms: Vec<TermStats>,
    position: usize,
    current: Option<TermStats>,
}

impl MemoryTermsEnum {
    fn new(terms: Vec<TermStats>) -> Self {
        MemoryTermsEnum {
            terms,
            position: 0,
            current: None,
        }
    }

    fn position_at(&mut self, index: usize) {
        self.position = index;
        self.current = self.terms.get(index).cloned();
    }
}

impl TermsEnum for MemoryTermsEnum {
    fn next(&mut self) -> Result<Option<TermStats>> {
        if self.position >= self.terms.len() {
            self.current = None;
            return Ok(None);
        }
        let stats = self.terms[self.position].clone();
        self.current = Some(stats.clone());
        self.position += 1;
        Ok(Some(stats))
    }

    fn seek(&mut self, target: &[u8]) -> Result<bool> {
        match self
            .terms
            .binary_search_by(|probe| probe.term.as_slice().cmp(target))
        {
            Ok(index) => {
                self.position_at(index);
                Ok(true)
            }
            Err(index) => {
                self.position_at(index);
                Ok(false)
            }
        }
    }

    fn seek_exact(&mut self, term: &[u8]) -> Result<bool> {
        match self
            .terms
            .binary_search_by(|probe| probe.term.as_slice().cmp(term))
        {
            Ok(index) => {
                self.position_at(index);
                Ok(true)
            }
            Err(_) => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn current(&self) -> Option<&TermStats> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dictionary() -> MemoryTermDictionary {
        let mut builder = TermDictionaryBuilder::new();
        builder.add_term(b"\x00bb".to_vec(), 1);
        builder.add_term(b"\x00aa".to_vec(), 0);
        builder.add_term(b"\x00aa".to_vec(), 2);
        builder.add_term(b"\x00aa".to_vec(), 2); // same doc twice
        builder.add_term(b"\x04a".to_vec(), 1);
        builder.build()
    }

    #[test]
    fn test_builder_sorts_and_deduplicates() {
        let dict = sample_dictionary();
        assert_eq!(dict.len(), 3);

        let terms: Vec<&[u8]> = dict.iter().map(|(term, _)| term).collect();
        assert_eq!(terms, vec![&b"\x00aa"[..], &b"\x00bb"[..], &b"\x04a"[..]]);

        let entry = dict.get(b"\x00aa").unwrap();
        assert_eq!(entry.postings, vec![0, 2]);
        assert_eq!(entry.doc_freq(), 2);
        assert_eq!(entry.total_term_freq, 3);

        assert!(dict.get(b"\x00ab").is_none());
    }

    #[test]
    fn test_builder_accepts_out_of_order_docs() {
        let mut builder = TermDictionaryBuilder::new();
        builder.add_term(b"t".to_vec(), 9);
        builder.add_term(b"t".to_vec(), 3);
        builder.add_term(b"t".to_vec(), 7);
        builder.add_term(b"t".to_vec(), 3);
        let dict = builder.build();
        assert_eq!(dict.get(b"t").unwrap().postings, vec![3, 7, 9]);
    }

    #[test]
    fn test_stats() {
        let stats = sample_dictionary().stats();
        assert_eq!(stats.term_count, 3);
        assert_eq!(stats.sum_doc_freq, 4);
        assert_eq!(stats.sum_total_term_freq, 5);
    }

    #[test]
    fn test_terms_enum_iteration() {
        let dict = sample_dictionary();
        let mut terms_enum = dict.iterator().unwrap();

        let mut seen = Vec::new();
        while let Some(stats) = terms_enum.next().unwrap() {
            seen.push(stats.term);
        }
        assert_eq!(seen, vec![b"\x00aa".to_vec(), b"\x00bb".to_vec(), b"\x04a".to_vec()]);
        assert!(terms_enum.current().is_none());
    }

    #[test]
    fn test_terms_enum_seek_peeks_then_next_returns_same_term() {
        let dict = sample_dictionary();
        let mut terms_enum = dict.iterator().unwrap();

        assert!(!terms_enum.seek(b"\x00ab").unwrap());
        assert_eq!(terms_enum.current().unwrap().term, b"\x00bb".to_vec());
        assert_eq!(terms_enum.next().unwrap().unwrap().term, b"\x00bb".to_vec());
        assert_eq!(terms_enum.next().unwrap().unwrap().term, b"\x04a".to_vec());

        assert!(terms_enum.seek(b"\x00aa").unwrap());
        assert_eq!(terms_enum.next().unwrap().unwrap().term, b"\x00aa".to_vec());

        // Past the last term.
        assert!(!terms_enum.seek(b"\xFF").unwrap());
        assert!(terms_enum.current().is_none());
        assert!(terms_enum.next().unwrap().is_none());
    }

    #[test]
    fn test_terms_enum_seek_exact() {
        let dict = sample_dictionary();
        let mut terms_enum = dict.iterator().unwrap();

        assert!(terms_enum.seek_exact(b"\x00bb").unwrap());
        assert_eq!(terms_enum.current().unwrap().doc_freq, 1);
        assert!(!terms_enum.seek_exact(b"\x00ab").unwrap());
        assert!(terms_enum.current().is_none());
    }

    #[test]
    fn test_postings_access() {
        let dict = sample_dictionary();
        let mut postings = dict.postings(b"\x00aa").unwrap().unwrap();
        assert!(postings.next().unwrap());
        assert_eq!(postings.doc_id(), 0);
        assert!(postings.next().unwrap());
        assert_eq!(postings.doc_id(), 2);
        assert!(!postings.next().unwrap());

        assert!(dict.postings(b"missing").unwrap().is_none());
    }

    #[test]
    fn test_persistence_round_trip() {
        let dict = sample_dictionary();
        let mut buf = Vec::new();
        dict.write_to(&mut buf).unwrap();

        let back = MemoryTermDictionary::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back.len(), dict.len());
        assert_eq!(back.stats(), dict.stats());
        for ((term_a, entry_a), (term_b, entry_b)) in dict.iter().zip(back.iter()) {
            assert_eq!(term_a, term_b);
            assert_eq!(entry_a, entry_b);
        }
    }

    #[test]
    fn test_persistence_round_trip_empty() {
        let dict = TermDictionaryBuilder::new().build();
        let mut buf = Vec::new();
        dict.write_to(&mut buf).unwrap();
        let back = MemoryTermDictionary::read_from(&mut Cursor::new(&buf)).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn test_read_rejects_bad_magic() {
        let dict = sample_dictionary();
        let mut buf = Vec::new();
        dict.write_to(&mut buf).unwrap();
        buf[0] ^= 0xFF;

        match MemoryTermDictionary::read_from(&mut Cursor::new(&buf)) {
            Err(TrievalError::Decoding(msg)) => assert!(msg.contains("magic")),
            other => panic!("expected decoding error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_rejects_corrupt_payload() {
        let dict = sample_dictionary();
        let mut buf = Vec::new();
        dict.write_to(&mut buf).unwrap();
        // Flip one payload byte; the checksum must catch it.
        let payload_start = 16;
        buf[payload_start + 3] ^= 0x01;

        match MemoryTermDictionary::read_from(&mut Cursor::new(&buf)) {
            Err(TrievalError::Decoding(msg)) => assert!(msg.contains("checksum")),
            other => panic!("expected decoding error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_rejects_truncated_input() {
        let dict = sample_dictionary();
        let mut buf = Vec::new();
        dict.write_to(&mut buf).unwrap();
        buf.truncate(buf.len() - 6);

        assert!(MemoryTermDictionary::read_from(&mut Cursor::new(&buf)).is_err());
    }
}
