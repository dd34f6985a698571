use crate::error::SeqResult;
use log::debug;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Most runs merged in one pass. Spilling past this folds the oldest runs
/// into one so iteration never holds more files open.
const MAX_MERGE_FAN_IN: usize = 64;

pub type MultisetIter<'a> = Box<dyn Iterator<Item = SeqResult<(Vec<u8>, u64)>> + 'a>;

/// Tally of distinct byte strings.
pub trait SequenceMultiset: Send {
    fn add(&mut self, seq: &[u8], count: u64) -> SeqResult<()>;

    fn clear(&mut self) -> SeqResult<()>;

    /// Distinct strings with their summed counts, in byte order.
    fn iter(&mut self) -> SeqResult<MultisetIter<'_>>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryMultiset {
    counts: BTreeMap<Vec<u8>, u64>,
}

impl MemoryMultiset {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceMultiset for MemoryMultiset {
    fn add(&mut self, seq: &[u8], count: u64) -> SeqResult<()> {
        match self.counts.get_mut(seq) {
            Some(total) => *total += count,
            None => {
                self.counts.insert(seq.to_vec(), count);
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> SeqResult<()> {
        self.counts.clear();
        Ok(())
    }

    fn iter(&mut self) -> SeqResult<MultisetIter<'_>> {
        Ok(Box::new(
            self.counts.iter().map(|(seq, &count)| Ok((seq.clone(), count))),
        ))
    }
}

/// Multiset that spills sorted runs to temporary files once its buffer
/// passes `memory_limit` bytes, and merges them back on iteration.
pub struct DiskMultiset {
    buffer: BTreeMap<Vec<u8>, u64>,
    buffered_bytes: usize,
    memory_limit: usize,
    temp_base: Option<PathBuf>,
    temp_dir: Option<TempDir>,
    runs: Vec<PathBuf>,
    next_run: usize,
}

impl DiskMultiset {
    pub fn new(memory_limit: usize) -> Self {
        Self {
            buffer: BTreeMap::new(),
            buffered_bytes: 0,
            memory_limit,
            temp_base: None,
            temp_dir: None,
            runs: Vec::new(),
            next_run: 0,
        }
    }

    /// Place spill files under `path` instead of the system temp directory.
    pub fn temp_dir(mut self, path: PathBuf) -> Self {
        self.temp_base = Some(path);
        self
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    fn spill_dir(&mut self) -> SeqResult<PathBuf> {
        if let Some(dir) = &self.temp_dir {
            return Ok(dir.path().to_path_buf());
        }
        let dir = match &self.temp_base {
            Some(base) => {
                std::fs::create_dir_all(base)?;
                TempDir::new_in(base)?
            }
            None => TempDir::new()?,
        };
        let path = dir.path().to_path_buf();
        self.temp_dir = Some(dir);
        Ok(path)
    }

    fn next_run_path(&mut self) -> SeqResult<PathBuf> {
        let path = self.spill_dir()?.join(format!("run-{}.bin", self.next_run));
        self.next_run += 1;
        Ok(path)
    }

    fn spill(&mut self) -> SeqResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let path = self.next_run_path()?;
        let entries = self.buffer.iter().map(|(seq, &count)| Ok((seq.as_slice(), count)));
        write_run(&path, entries)?;
        debug!(
            "spilled {} distinct reads to {}",
            self.buffer.len(),
            path.display()
        );
        self.buffer.clear();
        self.buffered_bytes = 0;
        self.runs.push(path);
        if self.runs.len() > MAX_MERGE_FAN_IN {
            self.merge_oldest_runs()?;
        }
        Ok(())
    }

    /// Replace the oldest `MAX_MERGE_FAN_IN` runs with their merge.
    fn merge_oldest_runs(&mut self) -> SeqResult<()> {
        let oldest: Vec<PathBuf> = self.runs.drain(..MAX_MERGE_FAN_IN).collect();
        let path = self.next_run_path()?;
        write_run(&path, MergedRuns::open(&oldest)?)?;
        for run in &oldest {
            std::fs::remove_file(run)?;
        }
        debug!("merged {} runs into {}", oldest.len(), path.display());
        self.runs.insert(0, path);
        Ok(())
    }
}

/// Write length-prefixed `(seq, count)` records in the order given.
fn write_run<I, S>(path: &Path, entries: I) -> SeqResult<()>
where
    I: IntoIterator<Item = SeqResult<(S, u64)>>,
    S: AsRef<[u8]>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for entry in entries {
        let (seq, count) = entry?;
        let seq = seq.as_ref();
        writer.write_all(&(seq.len() as u64).to_le_bytes())?;
        writer.write_all(seq)?;
        writer.write_all(&count.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

impl SequenceMultiset for DiskMultiset {
    fn add(&mut self, seq: &[u8], count: u64) -> SeqResult<()> {
        match self.buffer.get_mut(seq) {
            Some(total) => *total += count,
            None => {
                self.buffer.insert(seq.to_vec(), count);
                self.buffered_bytes += seq.len() + 2 * std::mem::size_of::<u64>();
            }
        }
        if self.buffered_bytes > self.memory_limit {
            self.spill()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> SeqResult<()> {
        self.buffer.clear();
        self.buffered_bytes = 0;
        for run in self.runs.drain(..) {
            std::fs::remove_file(run)?;
        }
        Ok(())
    }

    fn iter(&mut self) -> SeqResult<MultisetIter<'_>> {
        self.spill()?;
        Ok(Box::new(MergedRuns::open(&self.runs)?))
    }
}

struct RunReader {
    reader: BufReader<File>,
    idx: usize,
}

impl RunReader {
    fn open(path: &Path, idx: usize) -> SeqResult<Self> {
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
            idx,
        })
    }

    fn read_u64(&mut self) -> SeqResult<Option<u64>> {
        let mut buf = [0u8; 8];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => Ok(Some(u64::from_le_bytes(buf))),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn next(&mut self) -> SeqResult<Option<HeapEntry>> {
        let Some(len) = self.read_u64()? else {
            return Ok(None);
        };
        let mut seq = vec![0u8; len as usize];
        self.reader.read_exact(&mut seq)?;
        let mut count = [0u8; 8];
        self.reader.read_exact(&mut count)?;
        Ok(Some(HeapEntry {
            seq,
            count: u64::from_le_bytes(count),
            run_idx: self.idx,
        }))
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    seq: Vec<u8>,
    run_idx: usize,
    count: u64,
}

/// K-way merge of sorted runs, summing counts of equal strings.
struct MergedRuns {
    readers: Vec<RunReader>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    failed: bool,
}

impl MergedRuns {
    fn open(paths: &[PathBuf]) -> SeqResult<Self> {
        let readers = paths
            .iter()
            .enumerate()
            .map(|(idx, path)| RunReader::open(path, idx))
            .collect::<SeqResult<Vec<_>>>()?;
        Self::new(readers)
    }

    fn new(mut readers: Vec<RunReader>) -> SeqResult<Self> {
        let mut heap = BinaryHeap::with_capacity(readers.len());
        for reader in &mut readers {
            if let Some(entry) = reader.next()? {
                heap.push(Reverse(entry));
            }
        }
        Ok(Self {
            readers,
            heap,
            failed: false,
        })
    }

    fn refill(&mut self, run_idx: usize) -> SeqResult<()> {
        if let Some(entry) = self.readers[run_idx].next()? {
            self.heap.push(Reverse(entry));
        }
        Ok(())
    }

    fn next_distinct(&mut self) -> SeqResult<Option<(Vec<u8>, u64)>> {
        let Some(Reverse(first)) = self.heap.pop() else {
            return Ok(None);
        };
        self.refill(first.run_idx)?;
        let mut total = first.count;
        while self
            .heap
            .peek()
            .is_some_and(|Reverse(next)| next.seq == first.seq)
        {
            if let Some(Reverse(next)) = self.heap.pop() {
                total += next.count;
                self.refill(next.run_idx)?;
            }
        }
        Ok(Some((first.seq, total)))
    }
}

impl Iterator for MergedRuns {
    type Item = SeqResult<(Vec<u8>, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_distinct();
        if next.is_err() {
            self.failed = true;
        }
        next.transpose()
    }
}
