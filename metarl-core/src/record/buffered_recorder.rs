use super::{Record, RecordValue, Recorder};
use std::collections::HashMap;

/// Buffered recorder.
///
/// Written records are kept in memory. Stored records are aggregated on
/// [`Recorder::flush`]: scalar values are averaged over the stored records,
/// other values keep the latest one. The aggregated record is tagged with the
/// given step as `"step"` and appended to the written records.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// The number of written records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn aggregate(&mut self) -> Record {
        let mut sums: HashMap<String, (f32, usize)> = HashMap::new();
        let mut record = Record::empty();

        for r in self.storage.drain(..) {
            for (k, v) in r.into_iter_in_record() {
                match v {
                    RecordValue::Scalar(x) => {
                        let e = sums.entry(k).or_insert((0.0, 0));
                        e.0 += x;
                        e.1 += 1;
                    }
                    v => record.insert(k, v),
                }
            }
        }

        for (k, (sum, n)) in sums.into_iter() {
            record.insert(k, RecordValue::Scalar(sum / n as f32));
        }

        record
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn store(&mut self, record: Record) {
        self.storage.push(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let mut record = self.aggregate();
        record.insert("step", RecordValue::Scalar(step as f32));
        self.buf.push(record);
    }
}
