//! Character and byte level diffing.
//!
//! A thin layer over `similar`'s Myers implementation that returns
//! `(kind, segment)` runs and optionally post-processes them into
//! human-friendlier boundaries (see [`cleanup`]).

mod cleanup;

use serde::ser::{Serialize, SerializeTuple, Serializer};
use similar::{Algorithm, DiffTag, capture_diff_slices_deadline};
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Budget used when the caller does not pick one.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Delete,
    Equal,
    Insert,
}

impl ChangeKind {
    /// Wire code: `-1` delete, `0` equal, `1` insert.
    pub fn code(self) -> i8 {
        match self {
            ChangeKind::Delete => -1,
            ChangeKind::Equal => 0,
            ChangeKind::Insert => 1,
        }
    }

    pub fn from_code(code: i8) -> Option<ChangeKind> {
        match code {
            -1 => Some(ChangeKind::Delete),
            0 => Some(ChangeKind::Equal),
            1 => Some(ChangeKind::Insert),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum Segment {
    Text(String),
    Bytes(Vec<u8>),
}

impl Segment {
    pub fn len(&self) -> usize {
        match self {
            Segment::Text(text) => text.len(),
            Segment::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text(text) => Some(text),
            Segment::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Segment::Text(text) => text.as_bytes(),
            Segment::Bytes(bytes) => bytes,
        }
    }
}

/// One run of a diff. Serializes as a `[code, segment]` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffOp {
    pub kind: ChangeKind,
    pub segment: Segment,
}

impl DiffOp {
    pub fn text(kind: ChangeKind, text: impl Into<String>) -> DiffOp {
        DiffOp {
            kind,
            segment: Segment::Text(text.into()),
        }
    }

    pub fn bytes(kind: ChangeKind, bytes: impl Into<Vec<u8>>) -> DiffOp {
        DiffOp {
            kind,
            segment: Segment::Bytes(bytes.into()),
        }
    }
}

impl Serialize for DiffOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.kind.code())?;
        pair.serialize_element(&self.segment)?;
        pair.end()
    }
}

#[derive(Clone, Debug)]
pub struct DiffOptions {
    /// `None` runs to completion however long that takes.
    pub time_budget: Option<Duration>,
    pub semantic_cleanup: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            time_budget: Some(DEFAULT_TIME_BUDGET),
            semantic_cleanup: true,
        }
    }
}

impl DiffOptions {
    pub fn with_budget(time_budget: Duration) -> Self {
        Self {
            time_budget: Some(time_budget),
            ..Self::default()
        }
    }
}

/// Borrowed input to [`diff_payloads`]; both sides must be the same variant.
#[derive(Clone, Copy, Debug)]
pub enum Payload<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl Payload<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Bytes(_) => "bytes",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Bytes(bytes) => bytes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadMismatch {
    pub a: &'static str,
    pub b: &'static str,
}

impl fmt::Display for PayloadMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "both inputs must be the same type, got {} and {}",
            self.a, self.b
        )
    }
}

impl std::error::Error for PayloadMismatch {}

pub fn diff_text(a: &str, b: &str, options: &DiffOptions) -> Vec<DiffOp> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    diff_atoms(&a, &b, options)
        .into_iter()
        .map(|chunk| DiffOp::text(chunk.kind, chunk.items.into_iter().collect::<String>()))
        .collect()
}

pub fn diff_bytes(a: &[u8], b: &[u8], options: &DiffOptions) -> Vec<DiffOp> {
    diff_atoms(a, b, options)
        .into_iter()
        .map(|chunk| DiffOp::bytes(chunk.kind, chunk.items))
        .collect()
}

pub fn diff_payloads(
    a: Payload<'_>,
    b: Payload<'_>,
    options: &DiffOptions,
) -> Result<Vec<DiffOp>, PayloadMismatch> {
    match (a, b) {
        (Payload::Text(a), Payload::Text(b)) => Ok(diff_text(a, b, options)),
        (Payload::Bytes(a), Payload::Bytes(b)) => Ok(diff_bytes(a, b, options)),
        (a, b) => Err(PayloadMismatch {
            a: a.kind_name(),
            b: b.kind_name(),
        }),
    }
}

/// Concatenation of the segments of `kind` and equal runs, i.e. one side of
/// the diff rebuilt. `ChangeKind::Delete` gives the old input back,
/// `ChangeKind::Insert` the new one.
pub fn reconstruct(ops: &[DiffOp], kind: ChangeKind) -> Vec<u8> {
    ops.iter()
        .filter(|op| op.kind == ChangeKind::Equal || op.kind == kind)
        .flat_map(|op| op.segment.as_bytes().iter().copied())
        .collect()
}

/// A unit the diff runs over. Cleanup scores boundaries by character class,
/// so bytes are viewed as Latin-1.
pub(crate) trait Atom: Clone + Eq + Hash + Ord {
    fn as_char(&self) -> char;
}

impl Atom for char {
    fn as_char(&self) -> char {
        *self
    }
}

impl Atom for u8 {
    fn as_char(&self) -> char {
        char::from(*self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Chunk<T> {
    pub(crate) kind: ChangeKind,
    pub(crate) items: Vec<T>,
}

impl<T> Chunk<T> {
    pub(crate) fn new(kind: ChangeKind, items: Vec<T>) -> Self {
        Self { kind, items }
    }
}

fn diff_atoms<T: Atom>(a: &[T], b: &[T], options: &DiffOptions) -> Vec<Chunk<T>> {
    let started = Instant::now();
    let deadline = options.time_budget.map(|budget| started + budget);
    let raw = capture_diff_slices_deadline(Algorithm::Myers, a, b, deadline);
    if deadline.is_some_and(|d| Instant::now() > d) {
        log::warn!(
            target: "text_diff",
            "diff exceeded its {:?} budget; returning a coarse result",
            options.time_budget.unwrap_or_default()
        );
    }

    let mut chunks: Vec<Chunk<T>> = Vec::with_capacity(raw.len());
    for op in &raw {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => chunks.push(Chunk::new(ChangeKind::Equal, a[old].to_vec())),
            DiffTag::Delete => chunks.push(Chunk::new(ChangeKind::Delete, a[old].to_vec())),
            DiffTag::Insert => chunks.push(Chunk::new(ChangeKind::Insert, b[new].to_vec())),
            DiffTag::Replace => {
                chunks.push(Chunk::new(ChangeKind::Delete, a[old].to_vec()));
                chunks.push(Chunk::new(ChangeKind::Insert, b[new].to_vec()));
            }
        }
    }

    if options.semantic_cleanup {
        cleanup::cleanup_semantic(&mut chunks);
    } else {
        cleanup::cleanup_merge(&mut chunks);
    }
    log::trace!(
        target: "text_diff",
        "{} x {} atoms -> {} runs in {:?}",
        a.len(),
        b.len(),
        chunks.len(),
        started.elapsed()
    );
    chunks
}
