use crate::cd::SECTOR_SIZE;
use crate::gdi::track::error::{TrackError, TrackResult};
use crate::logger::SharedLogger;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

#[derive(Debug)]
enum FileHandle {
    Missing,
    Open(File),
    Unloaded,
}

/// Random access to the raw file backing a single track.
#[derive(Debug)]
pub struct TrackContent {
    path: PathBuf,
    sector_size: u32,
    file_size: Option<u64>,
    is_regular_file: bool,
    handle: Mutex<FileHandle>,
}

impl TrackContent {
    pub async fn open(
        dir: impl AsRef<Path>,
        filename: &str,
        sector_size: u32,
        logger: &SharedLogger,
    ) -> Self {
        let path = dir.as_ref().join(filename);
        let sector_size = if sector_size > 0 {
            sector_size
        } else {
            SECTOR_SIZE as u32
        };
        logger.log(&format!("Track file path: {}", path.display()));

        let (file_size, is_regular_file) = match fs::metadata(&path).await {
            Ok(meta) => (Some(meta.len()), meta.is_file()),
            Err(_) => (None, false),
        };

        let handle = if file_size.is_some() {
            match File::open(&path).await {
                Ok(file) => FileHandle::Open(file),
                Err(e) => {
                    logger.error(&format!(
                        "Failed to open track file {}: {e}",
                        path.display()
                    ));
                    FileHandle::Missing
                }
            }
        } else {
            FileHandle::Missing
        };

        Self {
            path,
            sector_size,
            file_size,
            is_regular_file,
            handle: Mutex::new(handle),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    /// The file exists, is a regular file and holds a whole number of sectors.
    pub fn is_valid(&self) -> bool {
        match self.file_size {
            Some(size) => self.is_regular_file && size % self.sector_size as u64 == 0,
            None => false,
        }
    }

    pub fn length_in_byte(&self) -> u64 {
        self.file_size.unwrap_or(0)
    }

    pub fn length_in_sector(&self) -> u64 {
        self.length_in_byte() / self.sector_size as u64
    }

    /// Reads up to `length` bytes at `file_offset` into `target[target_offset..]`.
    ///
    /// Returns the number of bytes actually read, which is short when the file ends first.
    pub async fn read_byte_data(
        &self,
        target: &mut [u8],
        target_offset: usize,
        file_offset: u64,
        length: usize,
    ) -> TrackResult<usize> {
        let mut handle = self.handle.lock().await;
        let file = match &mut *handle {
            FileHandle::Open(file) => file,
            FileHandle::Missing => return Err(TrackError::NotOpened(self.path.clone())),
            FileHandle::Unloaded => return Err(TrackError::Unloaded(self.path.clone())),
        };

        let end = (target_offset + length).min(target.len());
        if target_offset >= end {
            return Ok(0);
        }
        let buf = &mut target[target_offset..end];

        file.seek(SeekFrom::Start(file_offset)).await?;
        let mut total = 0;
        while total < buf.len() {
            let n = file.read(&mut buf[total..]).await?;
            if n == 0 {
                break;
            }
            total += n;
        }

        Ok(total)
    }

    /// Releases the file handle. Further reads fail with [`TrackError::Unloaded`].
    pub async fn unload(&self) {
        let mut handle = self.handle.lock().await;
        *handle = FileHandle::Unloaded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::default_logger;

    #[tokio::test]
    async fn valid_when_size_is_sector_multiple() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("track01.bin"), vec![0u8; SECTOR_SIZE * 3]).unwrap();

        let content = TrackContent::open(dir.path(), "track01.bin", 2352, &default_logger()).await;
        assert!(content.is_valid());
        assert_eq!(content.length_in_sector(), 3);
        assert_eq!(content.length_in_byte(), (SECTOR_SIZE * 3) as u64);
    }

    #[tokio::test]
    async fn invalid_when_size_is_not_sector_multiple() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("track01.bin"), vec![0u8; SECTOR_SIZE + 1]).unwrap();

        let content = TrackContent::open(dir.path(), "track01.bin", 2352, &default_logger()).await;
        assert!(!content.is_valid());
    }

    #[tokio::test]
    async fn invalid_when_missing_or_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let missing = TrackContent::open(dir.path(), "nope.bin", 2352, &default_logger()).await;
        assert!(!missing.is_valid());
        assert_eq!(missing.length_in_sector(), 0);

        let directory = TrackContent::open(dir.path(), "sub", 2352, &default_logger()).await;
        assert!(!directory.is_valid());
    }

    #[tokio::test]
    async fn zero_sector_size_falls_back_to_raw_sector() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.bin"), vec![0u8; SECTOR_SIZE]).unwrap();

        let content = TrackContent::open(dir.path(), "t.bin", 0, &default_logger()).await;
        assert_eq!(content.sector_size(), 2352);
        assert_eq!(content.length_in_sector(), 1);
    }

    #[tokio::test]
    async fn read_byte_data_reads_at_offset_and_stops_at_eof() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(SECTOR_SIZE).collect();
        std::fs::write(dir.path().join("t.bin"), &data).unwrap();
        let content = TrackContent::open(dir.path(), "t.bin", 2352, &default_logger()).await;

        let mut buf = vec![0u8; 8];
        let n = content.read_byte_data(&mut buf, 2, 10, 4).await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf[2..6], &data[10..14]);
        assert_eq!(&buf[..2], &[0, 0]);

        let mut tail = vec![0u8; 16];
        let n = content
            .read_byte_data(&mut tail, 0, (SECTOR_SIZE - 4) as u64, 16)
            .await
            .unwrap();
        assert_eq!(n, 4);
    }

    #[tokio::test]
    async fn read_after_unload_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.bin"), vec![1u8; SECTOR_SIZE]).unwrap();
        let content = TrackContent::open(dir.path(), "t.bin", 2352, &default_logger()).await;

        content.unload().await;
        let mut buf = vec![0u8; 4];
        let result = content.read_byte_data(&mut buf, 0, 0, 4).await;
        assert!(matches!(result, Err(TrackError::Unloaded(_))));
    }
}
