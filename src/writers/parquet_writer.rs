use crate::analyzers::vibrancy::{ScoreComponents, ScoredBuilding, VibrancyScore};
use crate::error::{AnalyticsError, Result};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{Array, Date32Array, Int64Array, StringArray, UInt8Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Days between 0001-01-01 and the Unix epoch, the origin of Arrow's Date32
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(AnalyticsError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write scored buildings, one batch per row group
    pub fn write_scores(&self, scores: &[ScoredBuilding], path: &Path) -> Result<()> {
        if scores.is_empty() {
            return Ok(());
        }

        let schema = Self::create_schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        for chunk in scores.chunks(self.row_group_size) {
            let batch = Self::scores_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }
        writer.close()?;

        debug!(rows = scores.len(), path = %path.display(), "Wrote parquet export");
        Ok(())
    }

    fn create_schema() -> Arc<Schema> {
        let fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("region_code", DataType::Utf8, true),
            Field::new("start_date", DataType::Date32, true),
            Field::new("foottraffic", DataType::Int64, true),
            Field::new("vibrancy", DataType::UInt8, false),
            Field::new("traffic_score", DataType::UInt8, false),
            Field::new("dwell_score", DataType::UInt8, false),
            Field::new("spread_score", DataType::UInt8, false),
        ];

        Arc::new(Schema::new(fields))
    }

    fn scores_to_batch(scores: &[ScoredBuilding], schema: Arc<Schema>) -> Result<RecordBatch> {
        let ids: Vec<String> = scores.iter().map(|s| s.id.clone()).collect();
        let names: Vec<String> = scores.iter().map(|s| s.name.clone()).collect();
        let regions: Vec<Option<String>> = scores.iter().map(|s| s.region_code.clone()).collect();
        let dates: Vec<Option<i32>> = scores
            .iter()
            .map(|s| {
                s.start_date
                    .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            })
            .collect();
        let traffic: Vec<Option<i64>> = scores.iter().map(|s| s.foottraffic).collect();
        let vibrancy: Vec<u8> = scores.iter().map(|s| s.vibrancy.score).collect();
        let traffic_scores: Vec<u8> = scores
            .iter()
            .map(|s| s.vibrancy.components.traffic_score)
            .collect();
        let dwell_scores: Vec<u8> = scores
            .iter()
            .map(|s| s.vibrancy.components.dwell_score)
            .collect();
        let spread_scores: Vec<u8> = scores
            .iter()
            .map(|s| s.vibrancy.components.spread_score)
            .collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(names)),
                Arc::new(StringArray::from(regions)),
                Arc::new(Date32Array::from(dates)),
                Arc::new(Int64Array::from(traffic)),
                Arc::new(UInt8Array::from(vibrancy)),
                Arc::new(UInt8Array::from(traffic_scores)),
                Arc::new(UInt8Array::from(dwell_scores)),
                Arc::new(UInt8Array::from(spread_scores)),
            ],
        )?;

        Ok(batch)
    }

    /// Read a score export back, used by `export --verify` and the tests
    pub fn read_scores(&self, path: &Path) -> Result<Vec<ScoredBuilding>> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut scores = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;

            let ids = column::<StringArray>(&batch, 0, "id")?;
            let names = column::<StringArray>(&batch, 1, "name")?;
            let regions = column::<StringArray>(&batch, 2, "region_code")?;
            let dates = column::<Date32Array>(&batch, 3, "start_date")?;
            let traffic = column::<Int64Array>(&batch, 4, "foottraffic")?;
            let vibrancy = column::<UInt8Array>(&batch, 5, "vibrancy")?;
            let traffic_scores = column::<UInt8Array>(&batch, 6, "traffic_score")?;
            let dwell_scores = column::<UInt8Array>(&batch, 7, "dwell_score")?;
            let spread_scores = column::<UInt8Array>(&batch, 8, "spread_score")?;

            for i in 0..batch.num_rows() {
                let start_date = if dates.is_null(i) {
                    None
                } else {
                    let days = dates.value(i) + UNIX_EPOCH_DAYS_FROM_CE;
                    Some(NaiveDate::from_num_days_from_ce_opt(days).ok_or_else(|| {
                        AnalyticsError::InvalidFormat("Invalid date in Parquet file".to_string())
                    })?)
                };

                scores.push(ScoredBuilding {
                    id: ids.value(i).to_string(),
                    name: names.value(i).to_string(),
                    region_code: (!regions.is_null(i)).then(|| regions.value(i).to_string()),
                    start_date,
                    foottraffic: (!traffic.is_null(i)).then(|| traffic.value(i)),
                    vibrancy: VibrancyScore {
                        score: vibrancy.value(i),
                        components: ScoreComponents {
                            traffic_score: traffic_scores.value(i),
                            dwell_score: dwell_scores.value(i),
                            spread_score: spread_scores.value(i),
                        },
                    },
                });
            }
        }

        Ok(scores)
    }

    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    index: usize,
    name: &str,
) -> Result<&'a T> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| AnalyticsError::InvalidFormat(format!("Invalid {} column type", name)))
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            self.total_rows as f64 / self.row_groups.max(1) as f64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn scored(id: &str, date: Option<NaiveDate>, traffic: Option<i64>) -> ScoredBuilding {
        ScoredBuilding {
            id: id.to_string(),
            name: format!("{} Tower", id),
            region_code: Some("IL".to_string()),
            start_date: date,
            foottraffic: traffic,
            vibrancy: VibrancyScore {
                score: 64,
                components: ScoreComponents {
                    traffic_score: 100,
                    dwell_score: 40,
                    spread_score: 40,
                },
            },
        }
    }

    #[test]
    fn test_write_empty_scores() {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new().unwrap();

        assert!(writer.write_scores(&[], temp_file.path()).is_ok());
    }

    #[test]
    fn test_scores_survive_parquet() -> Result<()> {
        let writer = ParquetWriter::new().with_row_group_size(2);
        let temp_file = NamedTempFile::new().unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let scores = vec![
            scored("a", Some(date), Some(1200)),
            scored("b", None, None),
            scored("c", Some(date), Some(0)),
        ];
        writer.write_scores(&scores, temp_file.path())?;

        assert_eq!(writer.read_scores(temp_file.path())?, scores);

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 3);
        assert_eq!(info.row_groups, 2);
        assert!(info.summary().contains("Total rows: 3"));

        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = [
            COMPRESSION_SNAPPY,
            COMPRESSION_GZIP,
            COMPRESSION_LZ4,
            COMPRESSION_ZSTD,
            COMPRESSION_NONE,
        ];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new().unwrap();

            let result = writer.write_scores(&[scored("a", None, Some(5))], temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli9").is_err());
        Ok(())
    }
}
