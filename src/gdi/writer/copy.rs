use crate::gdi::disc::GdiDisc;
use crate::gdi::writer::error::{WriterError, WriterResult};
use crate::gdi::writer::plan::CopySegment;
use indicatif::ProgressBar;
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Writes `segments` back to back into `out`, starting at byte 0.
///
/// Each segment starts where the previous one actually stopped. Returns the total bytes written.
pub async fn copy_segments(
    disc: &GdiDisc,
    segments: &[CopySegment],
    out: &mut File,
    buffer_sectors: usize,
    progress: Option<&ProgressBar>,
) -> WriterResult<u64> {
    let mut write_offset = 0u64;
    for segment in segments {
        write_offset += copy_segment(disc, segment, out, write_offset, buffer_sectors, progress).await?;
    }
    out.flush().await?;
    Ok(write_offset)
}

async fn copy_segment(
    disc: &GdiDisc,
    segment: &CopySegment,
    out: &mut File,
    write_offset: u64,
    buffer_sectors: usize,
    progress: Option<&ProgressBar>,
) -> WriterResult<u64> {
    let track = disc
        .track(segment.track)
        .ok_or(WriterError::MissingTrack(segment.track))?;
    let sector_size = track.sector_size() as u64;

    let total = segment.length_sectors * sector_size;
    let chunk_len = (sector_size * buffer_sectors.max(1) as u64).min(total) as usize;
    let mut buf = vec![0u8; chunk_len];

    let mut read_offset = segment.start_sector * sector_size;
    let mut written = 0u64;
    out.seek(SeekFrom::Start(write_offset)).await?;

    while written < total {
        let len = chunk_len.min((total - written) as usize);
        let read = track
            .content()
            .read_byte_data(&mut buf, 0, read_offset, len)
            .await?;
        if read == 0 {
            break;
        }

        let mut flushed = 0;
        while flushed < read {
            let n = out.write(&buf[flushed..read]).await?;
            if n == 0 {
                return Err(WriterError::ShortWrite {
                    track: segment.track,
                    expected: read,
                    written: flushed,
                });
            }
            flushed += n;
        }

        read_offset += read as u64;
        written += read as u64;
        if let Some(pb) = progress {
            pb.inc(read as u64);
        }
        if read < len {
            // source file ended early
            break;
        }
    }

    Ok(written)
}
