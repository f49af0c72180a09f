use crate::bucket::{Bucket, BucketFormat, Slot};
use crate::table::{ChainedHashTable, check_bounds};
use crate::{Error, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct BucketFile {
    active_count: usize,
    next_bucket: Option<usize>,
    kvs: Vec<Slot>,
}

#[derive(Serialize, Deserialize)]
struct TableFile {
    initial_buckets: usize,
    maximum_buckets: usize,
    #[serde(flatten)]
    format: BucketFormat,
    buckets: Vec<BucketFile>,
}

impl ChainedHashTable {
    /// Loads a table saved with [`ChainedHashTable::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if the bucket
    /// bounds are invalid, or if a bucket is inconsistent: active count not
    /// matching its slots or above capacity, a dangling next bucket, or a key
    /// or value wider than its field.
    pub fn from_jsonfile(filepath: impl AsRef<Path>) -> Result<ChainedHashTable> {
        let mut file = File::open(filepath.as_ref())?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let stored: TableFile = serde_json::from_str(&contents)?;
        check_bounds(&stored.format, stored.initial_buckets, stored.maximum_buckets)?;

        let count = stored.buckets.len();
        if count < stored.initial_buckets || count > stored.maximum_buckets {
            return Err(Error::Corrupt(format!(
                "{} buckets outside [{}, {}]",
                count, stored.initial_buckets, stored.maximum_buckets
            )));
        }
        let mut buckets = Vec::with_capacity(count);
        for (index, bucket) in stored.buckets.into_iter().enumerate() {
            if bucket.active_count != bucket.kvs.len() || bucket.active_count > stored.format.capacity {
                return Err(Error::Corrupt(format!(
                    "bucket {} has active count {} with {} slots",
                    index,
                    bucket.active_count,
                    bucket.kvs.len()
                )));
            }
            if let Some(next) = bucket.next_bucket
                && next >= count
            {
                return Err(Error::Corrupt(format!(
                    "bucket {} links to missing bucket {}",
                    index, next
                )));
            }
            for slot in &bucket.kvs {
                stored.format.check_key(slot.key)?;
                stored.format.check_value(slot.value)?;
            }
            buckets.push(Bucket {
                slots: bucket.kvs,
                next: bucket.next_bucket,
            });
        }

        Ok(ChainedHashTable {
            format: stored.format,
            initial_buckets: stored.initial_buckets,
            maximum_buckets: stored.maximum_buckets,
            buckets,
        })
    }

    /// Writes the table as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save(&self, filepath: impl AsRef<Path>) -> Result<()> {
        let stored = TableFile {
            initial_buckets: self.initial_buckets,
            maximum_buckets: self.maximum_buckets,
            format: self.format,
            buckets: self
                .buckets
                .iter()
                .map(|bucket| BucketFile {
                    active_count: bucket.active_count(),
                    next_bucket: bucket.next,
                    kvs: bucket.slots.clone(),
                })
                .collect(),
        };
        let mut writer = BufWriter::new(File::create(filepath.as_ref())?);
        serde_json::to_writer(&mut writer, &stored)?;
        writer.flush()?;
        info!(
            "saved hash table with {} buckets to {}",
            self.buckets.len(),
            filepath.as_ref().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load() -> anyhow::Result<()> {
        let mut table = ChainedHashTable::new(BucketFormat::BLIMP_KV, 2, 8)?;
        for key in 0..50 {
            table.insert(key * 3, key)?;
        }
        let path = std::env::temp_dir().join("pimsim-hashmap-roundtrip.json");
        table.save(&path)?;
        let loaded = ChainedHashTable::from_jsonfile(&path)?;
        std::fs::remove_file(&path)?;
        assert_eq!(loaded, table);
        assert_eq!(loaded.fetch(147), Some(49));
        Ok(())
    }

    #[test]
    fn test_dangling_link_rejected() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join("pimsim-hashmap-dangling.json");
        std::fs::write(
            &path,
            r#"{
                "initial_buckets": 1, "maximum_buckets": 4,
                "bucket_capacity": 31, "key_bytes": 4, "value_bytes": 0,
                "count_bytes": 1, "next_bytes": 3,
                "buckets": [{"active_count": 1, "next_bucket": 2, "kvs": [{"k": 5, "v": 0}]}]
            }"#,
        )?;
        let result = ChainedHashTable::from_jsonfile(&path);
        std::fs::remove_file(&path)?;
        assert!(matches!(result, Err(Error::Corrupt(_))));
        Ok(())
    }
}
