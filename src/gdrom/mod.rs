use crate::cd::TrackMode;
use crate::gdrom::error::{LayoutError, LayoutResult};
use crate::gdrom::track::GdRomTrack;
use std::collections::BTreeMap;
use std::fmt;

pub mod error;
pub mod track;

pub const SD_AREA_LAST_TRACK_NO: u8 = 2;
pub const HD_AREA_FIRST_TRACK_NO: u8 = 3;
pub const MAX_TRACK_NO: u8 = 99;

/// Track layouts the high density area may take.
///
/// - Pattern I: a single data track 3.
/// - Pattern II: data track 3 followed by audio tracks only.
/// - Pattern III: data track 3, audio tracks, then a closing data track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdAreaPattern {
    I,
    II,
    III,
    Invalid,
}

impl fmt::Display for HdAreaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::I => "Pattern I",
            Self::II => "Pattern II",
            Self::III => "Pattern III",
            Self::Invalid => "Invalid",
        };
        write!(f, "{name}")
    }
}

/// Convention-independent layout of a GD-ROM's single and high density program areas.
#[derive(Debug, Default)]
pub struct GdRomDisc {
    sd_area: BTreeMap<u8, GdRomTrack>,
    hd_area: BTreeMap<u8, GdRomTrack>,
}

impl GdRomDisc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sd_area(&self) -> impl Iterator<Item = &GdRomTrack> {
        self.sd_area.values()
    }

    pub fn hd_area(&self) -> impl Iterator<Item = &GdRomTrack> {
        self.hd_area.values()
    }

    pub fn track(&self, track_no: u8) -> Option<&GdRomTrack> {
        self.sd_area
            .get(&track_no)
            .or_else(|| self.hd_area.get(&track_no))
    }

    pub fn add_track_to_sd_area(&mut self, mut track: GdRomTrack) -> LayoutResult<u8> {
        let track_no = self.sd_area.len() as u8 + 1;
        if track_no > SD_AREA_LAST_TRACK_NO {
            return Err(LayoutError::SdAreaFull);
        }
        track.track_no = track_no;
        self.sd_area.insert(track_no, track);
        Ok(track_no)
    }

    pub fn set_track_to_sd_area(&mut self, track_no: u8, mut track: GdRomTrack) -> LayoutResult<()> {
        if !(1..=SD_AREA_LAST_TRACK_NO).contains(&track_no) {
            return Err(LayoutError::TrackNoOutOfRange(track_no));
        }
        track.track_no = track_no;
        self.sd_area.insert(track_no, track);
        Ok(())
    }

    pub fn track_count_of_hd_area(&self) -> usize {
        self.hd_area.len()
    }

    /// Highest track number in the high density area, or 2 while it is empty.
    pub fn last_track_no_of_hd_area(&self) -> u8 {
        self.hd_area
            .keys()
            .next_back()
            .copied()
            .unwrap_or(SD_AREA_LAST_TRACK_NO)
    }

    pub fn pattern_type_of_hd_area(&self) -> HdAreaPattern {
        let Some(last) = self.hd_area.values().next_back() else {
            return HdAreaPattern::Invalid;
        };

        match (last.mode, last.track_no) {
            (TrackMode::Data, 3) => HdAreaPattern::I,
            (TrackMode::Data, n) if n > 4 => HdAreaPattern::III,
            (TrackMode::Audio, n) if n > 3 => HdAreaPattern::II,
            _ => HdAreaPattern::Invalid,
        }
    }

    /// Appends `track` as the next high density track and returns its number.
    pub fn add_track_to_hd_area(&mut self, mut track: GdRomTrack) -> LayoutResult<u8> {
        match self.pattern_type_of_hd_area() {
            HdAreaPattern::III => return Err(LayoutError::HdAreaClosed),
            HdAreaPattern::I if track.mode == TrackMode::Data => {
                return Err(LayoutError::DataTrackAfterPatternI);
            }
            _ => {}
        }
        if self.hd_area.is_empty() && track.mode == TrackMode::Audio {
            return Err(LayoutError::AudioTrackAsFirstHdTrack);
        }

        let track_no = self.last_track_no_of_hd_area() + 1;
        if track_no > MAX_TRACK_NO {
            return Err(LayoutError::TrackNoOutOfRange(track_no));
        }
        track.track_no = track_no;
        self.hd_area.insert(track_no, track);
        Ok(track_no)
    }

    /// Places `track` at `track_no`, replacing any track already there.
    ///
    /// A number one past the last track appends.
    pub fn set_track_to_hd_area(&mut self, track_no: u8, mut track: GdRomTrack) -> LayoutResult<()> {
        let last_track_no = self.last_track_no_of_hd_area();
        match track_no as i32 - last_track_no as i32 {
            1 => return self.add_track_to_hd_area(track).map(|_| ()),
            d if d > 1 => {
                return Err(LayoutError::NonConsecutiveTrackNo {
                    track_no,
                    last_track_no,
                });
            }
            _ => {}
        }

        if !(HD_AREA_FIRST_TRACK_NO..=MAX_TRACK_NO).contains(&track_no) {
            return Err(LayoutError::TrackNoOutOfRange(track_no));
        }
        match (track_no, track.mode) {
            (3, TrackMode::Audio) => return Err(LayoutError::Track3MustBeData),
            (4, TrackMode::Data) => return Err(LayoutError::Track4MustBeAudio),
            (n, TrackMode::Data) if n > 4 && n < last_track_no => {
                return Err(LayoutError::DataTrackNotAtEdge(n));
            }
            _ => {}
        }

        track.track_no = track_no;
        self.hd_area.insert(track_no, track);
        Ok(())
    }

    fn track_at_fad(&self, fad: u32) -> Option<&GdRomTrack> {
        self.sd_area
            .values()
            .chain(self.hd_area.values())
            .find(|t| t.is_fad_in_range(fad))
    }

    pub async fn read_sector_raw(&self, fad: u32) -> LayoutResult<Option<Vec<u8>>> {
        match self.track_at_fad(fad) {
            Some(track) => track.read_sector_raw(fad).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> GdRomTrack {
        GdRomTrack::new(TrackMode::Data)
    }

    fn audio() -> GdRomTrack {
        GdRomTrack::new(TrackMode::Audio)
    }

    #[test]
    fn empty_hd_area_is_invalid() {
        let disc = GdRomDisc::new();
        assert_eq!(disc.last_track_no_of_hd_area(), 2);
        assert_eq!(disc.pattern_type_of_hd_area(), HdAreaPattern::Invalid);
    }

    #[test]
    fn sd_area_holds_two_tracks() {
        let mut disc = GdRomDisc::new();
        assert_eq!(disc.add_track_to_sd_area(data()).unwrap(), 1);
        assert_eq!(disc.add_track_to_sd_area(audio()).unwrap(), 2);
        assert!(matches!(disc.add_track_to_sd_area(audio()), Err(LayoutError::SdAreaFull)));
        assert!(matches!(
            disc.set_track_to_sd_area(3, audio()),
            Err(LayoutError::TrackNoOutOfRange(3))
        ));
        assert_eq!(disc.track(2).unwrap().mode, TrackMode::Audio);
    }

    #[test]
    fn patterns_follow_appended_tracks() {
        let mut disc = GdRomDisc::new();
        assert!(matches!(
            disc.add_track_to_hd_area(audio()),
            Err(LayoutError::AudioTrackAsFirstHdTrack)
        ));

        assert_eq!(disc.add_track_to_hd_area(data()).unwrap(), 3);
        assert_eq!(disc.pattern_type_of_hd_area(), HdAreaPattern::I);
        assert!(matches!(
            disc.add_track_to_hd_area(data()),
            Err(LayoutError::DataTrackAfterPatternI)
        ));

        assert_eq!(disc.add_track_to_hd_area(audio()).unwrap(), 4);
        assert_eq!(disc.pattern_type_of_hd_area(), HdAreaPattern::II);
        assert_eq!(disc.add_track_to_hd_area(audio()).unwrap(), 5);

        assert_eq!(disc.add_track_to_hd_area(data()).unwrap(), 6);
        assert_eq!(disc.pattern_type_of_hd_area(), HdAreaPattern::III);
        assert!(matches!(
            disc.add_track_to_hd_area(audio()),
            Err(LayoutError::HdAreaClosed)
        ));
        assert_eq!(disc.last_track_no_of_hd_area(), 6);
        assert_eq!(disc.track_count_of_hd_area(), 4);
    }

    #[test]
    fn set_track_enforces_positions() {
        let mut disc = GdRomDisc::new();
        assert!(matches!(
            disc.set_track_to_hd_area(5, data()),
            Err(LayoutError::NonConsecutiveTrackNo {
                track_no: 5,
                last_track_no: 2
            })
        ));

        disc.set_track_to_hd_area(3, data()).unwrap();
        disc.set_track_to_hd_area(4, audio()).unwrap();
        disc.set_track_to_hd_area(5, audio()).unwrap();
        disc.set_track_to_hd_area(6, audio()).unwrap();

        assert!(matches!(
            disc.set_track_to_hd_area(3, audio()),
            Err(LayoutError::Track3MustBeData)
        ));
        assert!(matches!(
            disc.set_track_to_hd_area(4, data()),
            Err(LayoutError::Track4MustBeAudio)
        ));
        assert!(matches!(
            disc.set_track_to_hd_area(5, data()),
            Err(LayoutError::DataTrackNotAtEdge(5))
        ));
        assert!(matches!(
            disc.set_track_to_hd_area(2, data()),
            Err(LayoutError::TrackNoOutOfRange(2))
        ));

        // replacing the last audio track with data closes the area
        disc.set_track_to_hd_area(6, data()).unwrap();
        assert_eq!(disc.pattern_type_of_hd_area(), HdAreaPattern::III);
        assert_eq!(disc.track(6).unwrap().track_no, 6);
    }

    #[test]
    fn track_four_cannot_become_data() {
        let mut disc = GdRomDisc::new();
        disc.set_track_to_hd_area(3, data()).unwrap();
        disc.set_track_to_hd_area(4, audio()).unwrap();
        assert_eq!(disc.pattern_type_of_hd_area(), HdAreaPattern::II);

        // replacing 4 in place is rejected, so the invalid layout can't be built
        assert!(disc.set_track_to_hd_area(4, data()).is_err());
        assert_eq!(disc.pattern_type_of_hd_area(), HdAreaPattern::II);
    }

    #[tokio::test]
    async fn disc_reads_sector_of_owning_track() {
        use crate::gdrom::track::{ContentPart, INDEX_01, TrackIndex};

        let mut track = audio();
        track.fad = 45000;
        track.length_in_sector = 10;
        track
            .set_index(
                INDEX_01,
                TrackIndex::new(45000, 10).with_part(ContentPart::memory(45000, 1, vec![3u8; 2352])),
            )
            .unwrap();

        let mut disc = GdRomDisc::new();
        disc.set_track_to_hd_area(3, data()).unwrap();
        disc.set_track_to_hd_area(4, track).unwrap();

        assert_eq!(disc.read_sector_raw(45000).await.unwrap(), Some(vec![3u8; 2352]));
        assert_eq!(disc.read_sector_raw(45005).await.unwrap(), Some(vec![0u8; 2352]));
        assert_eq!(disc.read_sector_raw(1).await.unwrap(), None);
    }
}
