use crate::cd::{PREGAP_SECTORS, RELOCATED_SECTORS};
use crate::gdi::disc::GdiDisc;
use crate::gdi::track::GdiTrack;

/// Tracks 1 and 2 form the low density area.
pub const LAST_LOW_DENSITY_TRACK: u32 = 2;
pub const FIRST_HIGH_DENSITY_TRACK: u32 = 3;

/// A run of whole sectors read from one source track file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopySegment {
    pub track: u32,
    /// Sector offset from the start of the source file
    pub start_sector: u64,
    pub length_sectors: u64,
}

/// Source ranges that make up one output track file, written back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPlan {
    SingleSegment(CopySegment),
    TwoSegment {
        first: CopySegment,
        second: CopySegment,
    },
}

impl CopyPlan {
    pub fn segments(&self) -> Vec<CopySegment> {
        match self {
            Self::SingleSegment(segment) => vec![*segment],
            Self::TwoSegment { first, second } => vec![*first, *second],
        }
    }

    pub fn total_sectors(&self) -> u64 {
        self.segments().iter().map(|s| s.length_sectors).sum()
    }
}

/// Decides which source ranges produce the generic format file for `track`.
///
/// Returns `None` when the track's own range is empty or starts before its file.
pub fn plan_track_copy(disc: &GdiDisc, track: &GdiTrack) -> Option<CopyPlan> {
    let number = track.number();

    if number <= LAST_LOW_DENSITY_TRACK {
        return own_range(track, 0).map(CopyPlan::SingleSegment);
    }

    if disc.needs_last_track_fix(track) {
        // the leading 75 sectors were appended to the previous track, the 150 before them are pregap
        let skip = (RELOCATED_SECTORS + PREGAP_SECTORS) as i64;
        return own_range(track, skip).map(CopyPlan::SingleSegment);
    }

    let own = own_range(track, 0)?;
    let next = disc.track(number + 1);

    if let Some(next) = next.filter(|n| disc.needs_last_track_fix(n)) {
        return Some(match relocated_head(next) {
            Some(second) => CopyPlan::TwoSegment { first: own, second },
            None => CopyPlan::SingleSegment(own),
        });
    }

    if number > FIRST_HIGH_DENSITY_TRACK && disc.is_redump_format_detected() {
        return Some(match next {
            Some(next) => CopyPlan::TwoSegment {
                first: own,
                second: pregap_head(next),
            },
            None => CopyPlan::SingleSegment(own),
        });
    }

    Some(CopyPlan::SingleSegment(own))
}

/// The track's normalized data range, starting `skip` sectors in.
fn own_range(track: &GdiTrack, skip: i64) -> Option<CopySegment> {
    let start_lba = track.normalized_start_lba_data() + skip;
    let length = track.end_lba() - start_lba;
    let offset = track.disc_lba_to_file_byte_offset(start_lba);
    if length <= 0 || offset < 0 {
        return None;
    }

    Some(CopySegment {
        track: track.number(),
        start_sector: offset as u64 / track.sector_size() as u64,
        length_sectors: length as u64,
    })
}

/// First 75 sectors of the final data track's content.
fn relocated_head(next: &GdiTrack) -> Option<CopySegment> {
    let offset = next.disc_lba_to_file_byte_offset(next.normalized_start_lba_data());
    if offset < 0 {
        return None;
    }
    let start_sector = offset as u64 / next.sector_size() as u64;
    let available = next.content().length_in_sector().saturating_sub(start_sector);

    Some(CopySegment {
        track: next.number(),
        start_sector,
        length_sectors: (RELOCATED_SECTORS as u64).min(available),
    })
}

/// The 150 pregap sectors redump embeds at the head of the following track's file.
fn pregap_head(next: &GdiTrack) -> CopySegment {
    CopySegment {
        track: next.number(),
        start_sector: 0,
        length_sectors: (PREGAP_SECTORS as u64).min(next.content().length_in_sector()),
    }
}
