use crate::gdi::disc::GdiDisc;
use crate::gdi::error::GdiResult;
use crate::gdi::layout::build_layout;
use crate::gdi::writer::{GeneralGdiWriter, WriteSummary, WriterOptions};
use crate::logger::SharedLogger;
use indicatif::MultiProgress;
use std::path::Path;

pub mod disc;
pub mod error;
pub mod ipbin;
pub mod layout;
pub mod track;
pub mod writer;

pub async fn load_gdi(gdi_path: impl AsRef<Path>, logger: SharedLogger) -> GdiResult<GdiDisc> {
    let gdi_path = gdi_path.as_ref();
    logger.log(&format!("Parsing GDI file: {gdi_path:?}"));
    GdiDisc::load_from_file(gdi_path, logger).await
}

/// Logs the track table, detected dump format, TOC consistency and layout pattern.
pub async fn show_info(gdi_path: impl AsRef<Path>, logger: SharedLogger) -> GdiResult<()> {
    let disc = load_gdi(gdi_path, logger.clone()).await?;
    disc.print_info();

    let format = if disc.is_redump_format_detected() {
        "Redump"
    } else {
        "TruRip/TOSEC"
    };
    logger.info(&format!("Dump format: {format}"));
    logger.info(&format!(
        "Valid: {}",
        if disc.is_valid() { "yes" } else { "no" }
    ));

    if let Some(ip_bin) = disc.ip_bin() {
        ip_bin.print_header();
    }
    // each mismatch was already reported while loading
    logger.info(&format!("TOC mismatches: {}", disc.toc_mismatches().len()));

    let (layout, rejected) = build_layout(&disc);
    logger.info(&format!("High density area: {}", layout.pattern_type_of_hd_area()));
    for (number, reason) in rejected {
        logger.warn(&format!("Track {number} breaks the GD-ROM layout: {reason}"));
    }

    disc.unload().await;
    Ok(())
}

/// Logs the IP.BIN header and TOC, plus a full hex dump when `hex` is set.
pub async fn show_ip_bin(gdi_path: impl AsRef<Path>, hex: bool, logger: SharedLogger) -> GdiResult<()> {
    let disc = load_gdi(gdi_path, logger).await?;
    if let Some(ip_bin) = disc.ip_bin() {
        ip_bin.print_header();
    }
    if hex {
        disc.print_ip_bin_info();
    }
    disc.unload().await;
    Ok(())
}

/// Rewrites the disc at `gdi_path` into `output_dir` using the generic convention.
pub async fn convert_to_general_gdi(
    pb: Option<MultiProgress>,
    gdi_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: WriterOptions,
    logger: SharedLogger,
) -> GdiResult<WriteSummary> {
    let disc = load_gdi(gdi_path, logger.clone()).await?;
    if disc.is_redump_format_detected() {
        logger.info("Redump format detected");
    }

    let mut writer = GeneralGdiWriter::create(&disc, output_dir, logger.clone())
        .await?
        .with_options(options);
    if let Some(pb) = pb {
        writer = writer.with_progress(pb);
    }

    let summary = writer.exec().await?;
    disc.unload().await;

    logger.log("Conversion complete!");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cd::SECTOR_SIZE;
    use crate::gdi::disc::tests::{audio_track, data_track_with_ip_bin};
    use crate::gdi::error::GdiError;
    use crate::gdi::ipbin::tests::ip_bin_with_toc;
    use crate::gdi::writer::error::WriterError;
    use crate::logger::default_logger;

    #[tokio::test]
    async fn converts_disc_from_gdi_file() {
        let src = tempfile::tempdir().unwrap();
        let ip = ip_bin_with_toc(&[(45150, 0x41)]);
        std::fs::write(src.path().join("t1.bin"), vec![7u8; SECTOR_SIZE * 3]).unwrap();
        std::fs::write(src.path().join("t2.raw"), audio_track(5, false)).unwrap();
        std::fs::write(src.path().join("t3.bin"), data_track_with_ip_bin(&ip, 20)).unwrap();
        std::fs::write(
            src.path().join("game.gdi"),
            "3\n1 0 4 2352 t1.bin 0\n2 10 0 2352 t2.raw 0\n3 45000 4 2352 t3.bin 0\n",
        )
        .unwrap();

        let out = tempfile::tempdir().unwrap();
        let summary = convert_to_general_gdi(
            None,
            src.path().join("game.gdi"),
            out.path(),
            WriterOptions::default(),
            default_logger(),
        )
        .await
        .unwrap();

        assert_eq!(summary.tracks_written, vec![1, 2, 3]);
        assert!(out.path().join("disc.gdi").is_file());
        assert_eq!(
            std::fs::metadata(out.path().join("track03.bin")).unwrap().len(),
            (SECTOR_SIZE * 20) as u64
        );
    }

    #[tokio::test]
    async fn info_reports_format_and_pattern() {
        use crate::logger::tests::{Level, MemoryLogger};
        use std::sync::Arc;

        let src = tempfile::tempdir().unwrap();
        let ip = ip_bin_with_toc(&[(45150, 0x41)]);
        std::fs::write(src.path().join("t1.bin"), vec![7u8; SECTOR_SIZE * 3]).unwrap();
        std::fs::write(src.path().join("t2.raw"), audio_track(5, false)).unwrap();
        std::fs::write(src.path().join("t3.bin"), data_track_with_ip_bin(&ip, 20)).unwrap();
        std::fs::write(
            src.path().join("game.gdi"),
            "3\n1 0 4 2352 t1.bin 0\n2 10 0 2352 t2.raw 0\n3 45000 4 2352 t3.bin 0\n",
        )
        .unwrap();

        let logger = Arc::new(MemoryLogger::default());
        show_info(src.path().join("game.gdi"), logger.clone())
            .await
            .unwrap();

        assert!(logger.contains(Level::Info, "Dump format: TruRip/TOSEC"));
        assert!(logger.contains(Level::Info, "High density area: Pattern I"));
        assert!(logger.contains(Level::Info, "SONIC"));
        assert!(logger.contains(Level::Info, "TOC mismatches: 0"));
        assert_eq!(logger.count(Level::Warn), 0);
    }

    #[tokio::test]
    async fn missing_gdi_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = show_ip_bin(dir.path().join("none.gdi"), false, default_logger()).await;
        assert!(matches!(result, Err(GdiError::GdiFileNotFound(_))));
    }

    #[tokio::test]
    async fn conversion_of_invalid_disc_fails() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("game.gdi"), "3\n1 0 4 2352 t1.bin 0\n").unwrap();

        let out = tempfile::tempdir().unwrap();
        let result = convert_to_general_gdi(
            None,
            src.path().join("game.gdi"),
            out.path(),
            WriterOptions::default(),
            default_logger(),
        )
        .await;

        assert!(matches!(
            result,
            Err(GdiError::WriterError(WriterError::InvalidDisc))
        ));
    }
}
