pub mod copy;
pub mod error;
pub mod plan;

use crate::gdi::disc::GdiDisc;
use crate::gdi::track::GdiTrack;
use crate::gdi::writer::copy::copy_segments;
use crate::gdi::writer::error::{WriterError, WriterResult};
use crate::gdi::writer::plan::{CopyPlan, plan_track_copy};
use crate::logger::SharedLogger;
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

pub const OUTPUT_GDI_FILENAME: &str = "disc.gdi";
const DEFAULT_COPY_BUFFER_SECTORS: usize = 10240;
const DEFAULT_MAX_CONCURRENT_TRACKS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    /// Copy buffer length in sectors, ~24MB by default
    pub copy_buffer_sectors: usize,
    /// Convert tracks concurrently; each output file is still written in order
    pub concurrent: bool,
    /// Upper bound on tracks in flight, each holding its own copy buffer
    pub max_concurrent_tracks: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            copy_buffer_sectors: DEFAULT_COPY_BUFFER_SECTORS,
            concurrent: true,
            max_concurrent_tracks: DEFAULT_MAX_CONCURRENT_TRACKS,
        }
    }
}

impl WriterOptions {
    fn tracks_in_flight(&self) -> usize {
        if self.concurrent {
            self.max_concurrent_tracks.max(1)
        } else {
            1
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub tracks_written: Vec<u32>,
    pub tracks_failed: Vec<u32>,
}

/// Writes a disc in the generic (TruRip/TOSEC) convention, whatever convention it was dumped in.
pub struct GeneralGdiWriter<'a> {
    disc: &'a GdiDisc,
    output_dir: PathBuf,
    options: WriterOptions,
    progress: Option<MultiProgress>,
    logger: SharedLogger,
}

impl<'a> GeneralGdiWriter<'a> {
    pub async fn create(
        disc: &'a GdiDisc,
        output_dir: impl AsRef<Path>,
        logger: SharedLogger,
    ) -> WriterResult<Self> {
        if !disc.is_valid() {
            return Err(WriterError::InvalidDisc);
        }

        let output_dir = output_dir.as_ref().to_path_buf();
        match fs::metadata(&output_dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(WriterError::OutputDirectoryNotFound(output_dir)),
        }

        Ok(Self {
            disc,
            output_dir,
            options: WriterOptions::default(),
            progress: None,
            logger,
        })
    }

    pub fn with_options(mut self, options: WriterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn exec(&self) -> WriterResult<WriteSummary> {
        self.write_gdi_cue_file().await?;
        Ok(self.write_gdi_track_files().await)
    }

    pub fn output_track_filename(&self, number: u32) -> String {
        match self.disc.track(number) {
            Some(track) if track.is_data_track() => format!("track{number:02}.bin"),
            Some(_) => format!("track{number:02}.raw"),
            None => "track_error.bin".to_string(),
        }
    }

    /// Cue sheet text in the generic convention.
    pub fn cue_sheet(&self) -> String {
        let count = self.disc.track_count();
        let mut cue = format!("{count}\n");

        for number in 1..=count {
            let Some(track) = self.disc.track(number) else {
                continue;
            };
            cue.push_str(&format!(
                "{} {} {} {} {} {}\n",
                number,
                self.disc.generic_start_lba(track),
                track.track_type().type_id(),
                track.sector_size(),
                self.output_track_filename(number),
                0
            ));
        }

        cue
    }

    async fn write_gdi_cue_file(&self) -> WriterResult<()> {
        let path = self.output_dir.join(OUTPUT_GDI_FILENAME);
        let result = async {
            let mut writer = BufWriter::new(File::create(&path).await?);
            writer.write_all(self.cue_sheet().as_bytes()).await?;
            writer.flush().await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = &result {
            self.logger
                .error(&format!("Failed to write {}: {e}", path.display()));
        }
        Ok(result?)
    }

    async fn write_gdi_track_files(&self) -> WriteSummary {
        if self.disc.is_redump_format_detected() {
            if let Some(last) = self.disc.track(self.disc.track_count()) {
                if last.is_audio_track() {
                    self.logger.warn(
                        "Redump disc ends with an audio track, its trailing sectors are copied as-is",
                    );
                }
            }
        }

        // results come back in track order
        let results: Vec<(u32, WriterResult<u64>)> = stream::iter(self.disc.tracks())
            .map(|t| async move { (t.number(), self.write_track(t).await) })
            .buffered(self.options.tracks_in_flight())
            .collect()
            .await;

        let mut summary = WriteSummary::default();
        for (number, result) in results {
            match result {
                Ok(bytes) => {
                    self.logger.info(&format!(
                        "Track {number} is finished copying ({bytes} bytes)."
                    ));
                    summary.tracks_written.push(number);
                }
                Err(e) => {
                    self.logger
                        .error(&format!("Track {number} was not written: {e}"));
                    summary.tracks_failed.push(number);
                }
            }
        }
        summary
    }

    async fn write_track(&self, track: &GdiTrack) -> WriterResult<u64> {
        let number = track.number();
        let plan = plan_track_copy(self.disc, track).ok_or(WriterError::EmptyRange(number))?;
        if let CopyPlan::TwoSegment { second, .. } = &plan {
            self.logger.log(&format!(
                "Track {number}: appending {} sectors from track {}",
                second.length_sectors, second.track
            ));
        }

        let path = self.output_dir.join(self.output_track_filename(number));
        let mut out = File::create(&path).await?;
        let progress = self.progress_bar(number, &plan, track.sector_size());

        let written = copy_segments(
            self.disc,
            &plan.segments(),
            &mut out,
            self.options.copy_buffer_sectors,
            progress.as_ref(),
        )
        .await?;

        if let Some(pb) = progress {
            pb.finish_with_message(format!("track {number:02}"));
        }
        Ok(written)
    }

    fn progress_bar(&self, number: u32, plan: &CopyPlan, sector_size: u32) -> Option<ProgressBar> {
        let mp = self.progress.as_ref()?;
        let pb = mp.add(ProgressBar::new(plan.total_sectors() * sector_size as u64));
        let style = ProgressStyle::with_template("  {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(format!("track {number:02}"));
        Some(pb)
    }
}
