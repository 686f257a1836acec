use crate::cd::FAD_LBA_OFFSET;
use crate::gdi::disc::GdiDisc;
use crate::gdi::track::GdiTrack;
use crate::gdi::writer::plan::{LAST_LOW_DENSITY_TRACK, plan_track_copy};
use crate::gdrom::GdRomDisc;
use crate::gdrom::error::{LayoutError, LayoutResult};
use crate::gdrom::track::{ContentPart, GdRomTrack, INDEX_00, INDEX_01, TrackIndex};

/// Builds the abstract layout of `disc` as the generic convention would place it.
///
/// Tracks the layout rules reject are left out and returned with the reason.
pub fn build_layout(disc: &GdiDisc) -> (GdRomDisc, Vec<(u32, LayoutError)>) {
    let mut layout = GdRomDisc::new();
    let mut rejected = Vec::new();

    for track in disc.tracks() {
        let number = track.number();
        let result = layout_track(disc, track).and_then(|gd| {
            if number <= LAST_LOW_DENSITY_TRACK {
                layout.set_track_to_sd_area(number as u8, gd)
            } else {
                let track_no = u8::try_from(number).map_err(|_| LayoutError::TrackNoOutOfRange(u8::MAX))?;
                layout.set_track_to_hd_area(track_no, gd)
            }
        });
        if let Err(e) = result {
            rejected.push((number, e));
        }
    }

    (layout, rejected)
}

fn layout_track(disc: &GdiDisc, track: &GdiTrack) -> LayoutResult<GdRomTrack> {
    let mut gd = GdRomTrack::new(track.track_type().mode());
    gd.track_no = u8::try_from(track.number()).unwrap_or(u8::MAX);
    gd.sector_size = track.content().sector_size();

    let data_fad = (disc.generic_start_lba(track) + FAD_LBA_OFFSET as i64).max(0) as u32;
    let index00_length = gd.length_of_index00_in_sector().min(data_fad);
    let index00_fad = data_fad - index00_length;

    let mut index01 = TrackIndex::new(data_fad, 0);
    if let Some(plan) = plan_track_copy(disc, track) {
        let mut fad = data_fad;
        for segment in plan.segments() {
            let Some(source) = disc.track(segment.track) else {
                continue;
            };
            let offset = segment.start_sector * source.content().sector_size() as u64;
            let length = segment.length_sectors as u32;
            index01.add_part(ContentPart::file_region(fad, length, source.content().path(), offset));
            fad += length;
        }
        index01.length_in_sector = fad - data_fad;
    }

    gd.fad = index00_fad;
    gd.length_in_sector = index00_length + index01.length_in_sector;
    gd.set_index(INDEX_00, TrackIndex::new(index00_fad, index00_length))?;
    gd.set_index(INDEX_01, index01)?;
    Ok(gd)
}
