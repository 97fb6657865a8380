//! Fixed placement of decoration slots inside a corridor segment.
//!
//! Offsets are relative to the segment center; the streaming axis is Z.

use std::f32::consts::FRAC_PI_2;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CorridorDims {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    /// Segment length along the streaming axis.
    #[serde(default = "default_length")]
    pub length: f32,
    /// Light stations per segment; each station carries one slot per wall.
    #[serde(default = "default_lights")]
    pub lights: u32,
    #[serde(default = "default_picture_size")]
    pub picture_size: f32,
    #[serde(default = "default_caption_offset")]
    pub caption_offset: f32,
    #[serde(default = "default_caption_line_len")]
    pub caption_line_len: usize,
}

fn default_width() -> f32 {
    4.0
}
fn default_height() -> f32 {
    2.0
}
fn default_length() -> f32 {
    35.0
}
fn default_lights() -> u32 {
    6
}
fn default_picture_size() -> f32 {
    1.2
}
fn default_caption_offset() -> f32 {
    0.2
}
fn default_caption_line_len() -> usize {
    35
}

impl Default for CorridorDims {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            length: default_length(),
            lights: default_lights(),
            picture_size: default_picture_size(),
            caption_offset: default_caption_offset(),
            caption_line_len: default_caption_line_len(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotSide {
    Left,
    Right,
}

impl SlotSide {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            SlotSide::Left => -1.0,
            SlotSide::Right => 1.0,
        }
    }
}

/// Relative position and yaw (radians about +Y) of an attached surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub offset: [f32; 3],
    pub yaw: f32,
}

/// Something mounted at a fixed spot inside its segment.
pub trait Attached {
    fn anchor(&self) -> Anchor;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotPlacement {
    pub side: SlotSide,
    pub picture: Anchor,
    pub caption: Anchor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlotLayout {
    placements: Vec<SlotPlacement>,
    pub picture_size: f32,
    pub caption_line_len: usize,
}

impl SlotLayout {
    pub fn from_placements(
        placements: Vec<SlotPlacement>,
        picture_size: f32,
        caption_line_len: usize,
    ) -> Self {
        Self {
            placements,
            picture_size,
            caption_line_len,
        }
    }

    /// Left/right pairs at `lights` evenly spaced stations along the segment.
    pub fn corridor(dims: &CorridorDims) -> Self {
        let interval = dims.length / (dims.lights as f32 + 1.0);
        let wall_x = dims.width * 0.5 - 0.1;
        let caption_y = -(dims.picture_size * 0.5 + dims.caption_offset);
        let mut placements = Vec::with_capacity(dims.lights as usize * 2);
        for i in 1..=dims.lights {
            let z = i as f32 * interval - dims.length * 0.5;
            for side in [SlotSide::Left, SlotSide::Right] {
                let x = side.sign() * wall_x;
                let yaw = -side.sign() * FRAC_PI_2;
                placements.push(SlotPlacement {
                    side,
                    picture: Anchor {
                        offset: [x, 0.0, z],
                        yaw,
                    },
                    caption: Anchor {
                        offset: [x, caption_y, z],
                        yaw,
                    },
                });
            }
        }
        Self::from_placements(placements, dims.picture_size, dims.caption_line_len)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn placements(&self) -> &[SlotPlacement] {
        &self.placements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-5
    }

    #[test]
    fn default_corridor_has_twelve_slots_in_pairs() {
        let layout = SlotLayout::corridor(&CorridorDims::default());
        assert_eq!(layout.len(), 12);
        for pair in layout.placements().chunks(2) {
            assert_eq!(pair[0].side, SlotSide::Left);
            assert_eq!(pair[1].side, SlotSide::Right);
            assert!(approx(pair[0].picture.offset[2], pair[1].picture.offset[2]));
            assert!(approx(pair[0].picture.offset[0], -1.9));
            assert!(approx(pair[1].picture.offset[0], 1.9));
        }
    }

    #[test]
    fn stations_are_evenly_spaced_inside_the_segment() {
        let dims = CorridorDims::default();
        let layout = SlotLayout::corridor(&dims);
        let zs: Vec<f32> = layout
            .placements()
            .iter()
            .step_by(2)
            .map(|p| p.picture.offset[2])
            .collect();
        assert!(approx(zs[0], 5.0 - 17.5));
        for w in zs.windows(2) {
            assert!(approx(w[1] - w[0], 5.0));
        }
        assert!(zs.iter().all(|z| z.abs() < dims.length * 0.5));
    }

    #[test]
    fn captions_hang_below_pictures_facing_the_aisle() {
        let layout = SlotLayout::corridor(&CorridorDims::default());
        let p = layout.placements()[0];
        assert!(approx(p.caption.offset[1], -0.8));
        assert!(approx(p.picture.yaw, FRAC_PI_2));
        assert!(approx(layout.placements()[1].picture.yaw, -FRAC_PI_2));
    }

    #[test]
    fn fewer_lights_shrink_the_layout() {
        let dims = CorridorDims {
            lights: 2,
            ..CorridorDims::default()
        };
        let layout = SlotLayout::corridor(&dims);
        assert_eq!(layout.len(), 4);
        assert_eq!(layout.caption_line_len, 35);
    }
}
