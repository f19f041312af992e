//! Sprite sheets and frame-animated sprites.
//!
//! A sheet is plain data: frames cut from one or more images and named animations over those
//! frames. Sheet JSON follows the common exporter layout:
//!
//! ```json
//! {
//!   "images": ["hero.png"],
//!   "frames": {"width": 32, "height": 32, "regX": 16, "regY": 16},
//!   "animations": {"idle": 0, "run": [1, 6, "idle", 0.5], "jump": {"frames": [7, 8], "next": false}}
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::animation::timeline::FrameTarget;
use crate::foundation::error::{FlitterError, FlitterResult};
use crate::geom::{BoundingBox, Point, Rect};
use crate::render::surface::ImageSurface;

/// Serialized sprite sheet description.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct SpriteSheetData {
    /// Image paths, relative to the sheet file.
    #[serde(default)]
    pub images: Vec<String>,
    pub frames: FramesDef,
    #[serde(default)]
    pub animations: BTreeMap<String, AnimationDef>,
    /// Suggested playback rate in frames per second.
    #[serde(default)]
    pub framerate: Option<f64>,
}

/// Frame table: explicit rectangles or a uniform grid.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum FramesDef {
    /// `[x, y, width, height, image?, reg_x?, reg_y?]` per frame.
    List(Vec<Vec<f64>>),
    Grid(GridDef),
}

/// Grid frame layout, tiled row by row over every image.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDef {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub reg_x: f64,
    #[serde(default)]
    pub reg_y: f64,
    #[serde(default)]
    pub spacing: f64,
    #[serde(default)]
    pub margin: f64,
}

/// One animation entry.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum AnimationDef {
    /// A single frame index.
    Frame(usize),
    /// `[start, end, next?, speed?]`, inclusive range.
    Range(Vec<serde_json::Value>),
    Sequence {
        frames: Vec<usize>,
        #[serde(default)]
        next: Option<NextDef>,
        #[serde(default)]
        speed: Option<f64>,
    },
}

/// `next` field: an animation name, `true` (loop) or `false` (stop).
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum NextDef {
    Name(String),
    Flag(bool),
}

impl SpriteSheetData {
    pub fn from_reader<R: std::io::Read>(r: R) -> FlitterResult<Self> {
        serde_json::from_reader(r).map_err(|e| FlitterError::serde(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> FlitterResult<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("open sprite sheet '{}'", path.display()))?;
        Self::from_reader(std::io::BufReader::new(f))
    }
}

/// A frame of a sheet, in image pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteFrame {
    pub image: usize,
    pub rect: Rect,
    pub reg_x: f64,
    pub reg_y: f64,
}

impl SpriteFrame {
    /// Local bounds: the frame rect placed so the registration point sits at the origin.
    pub fn local_bounds(&self) -> BoundingBox {
        BoundingBox::from_rect(Rect::new(
            -self.reg_x,
            -self.reg_y,
            self.rect.width() - self.reg_x,
            self.rect.height() - self.reg_y,
        ))
    }
}

/// A resolved animation.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteAnimation {
    pub frames: Vec<usize>,
    /// Animation played after this one; `None` stops on the last frame.
    pub next: Option<String>,
    /// Frames advanced per tick.
    pub speed: f64,
}

/// Resolved sheet: frames, animations and the images they cut from.
#[derive(Debug)]
pub struct SpriteSheet {
    images: Vec<Arc<ImageSurface>>,
    frames: Vec<SpriteFrame>,
    animations: BTreeMap<String, SpriteAnimation>,
    framerate: Option<f64>,
}

impl SpriteSheet {
    pub fn new(data: &SpriteSheetData, images: Vec<Arc<ImageSurface>>) -> FlitterResult<Self> {
        if images.is_empty() {
            return Err(FlitterError::validation("sprite sheet has no images"));
        }
        let frames = match &data.frames {
            FramesDef::List(list) => list
                .iter()
                .enumerate()
                .map(|(i, f)| explicit_frame(i, f, images.len()))
                .collect::<FlitterResult<Vec<_>>>()?,
            FramesDef::Grid(grid) => tile_frames(grid, &images)?,
        };
        if frames.is_empty() {
            return Err(FlitterError::validation("sprite sheet has no frames"));
        }

        let mut animations = BTreeMap::new();
        for (name, def) in &data.animations {
            let anim = resolve_animation(name, def)?;
            if let Some(bad) = anim.frames.iter().find(|f| **f >= frames.len()) {
                return Err(FlitterError::validation(format!(
                    "animation '{name}' references frame {bad} of {}",
                    frames.len()
                )));
            }
            animations.insert(name.clone(), anim);
        }
        for (name, anim) in &animations {
            if let Some(next) = &anim.next
                && !animations.contains_key(next)
            {
                return Err(FlitterError::validation(format!(
                    "animation '{name}' continues with unknown animation '{next}'"
                )));
            }
        }

        Ok(Self {
            images,
            frames,
            animations,
            framerate: data.framerate,
        })
    }

    /// Load a sheet file and decode its images relative to the file's directory.
    pub fn open(path: impl AsRef<Path>) -> FlitterResult<Self> {
        let path = path.as_ref();
        let data = SpriteSheetData::from_path(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let images = data
            .images
            .iter()
            .map(|rel| ImageSurface::open(base.join(rel)).map(Arc::new))
            .collect::<FlitterResult<Vec<_>>>()?;
        Self::new(&data, images)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Option<&SpriteFrame> {
        self.frames.get(index)
    }

    pub fn image(&self, index: usize) -> Option<&Arc<ImageSurface>> {
        self.images.get(index)
    }

    pub fn animation(&self, name: &str) -> Option<&SpriteAnimation> {
        self.animations.get(name)
    }

    pub fn animations(&self) -> impl Iterator<Item = (&str, &SpriteAnimation)> {
        self.animations.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn framerate(&self) -> Option<f64> {
        self.framerate
    }
}

fn explicit_frame(index: usize, f: &[f64], image_count: usize) -> FlitterResult<SpriteFrame> {
    if f.len() < 4 {
        return Err(FlitterError::validation(format!(
            "frame {index} needs at least [x, y, width, height]"
        )));
    }
    let image = f.get(4).copied().unwrap_or(0.0) as usize;
    if image >= image_count {
        return Err(FlitterError::validation(format!(
            "frame {index} references image {image} of {image_count}"
        )));
    }
    Ok(SpriteFrame {
        image,
        rect: Rect::new(f[0], f[1], f[0] + f[2], f[1] + f[3]),
        reg_x: f.get(5).copied().unwrap_or(0.0),
        reg_y: f.get(6).copied().unwrap_or(0.0),
    })
}

fn tile_frames(grid: &GridDef, images: &[Arc<ImageSurface>]) -> FlitterResult<Vec<SpriteFrame>> {
    if !(grid.width > 0.0 && grid.height > 0.0) {
        return Err(FlitterError::validation("grid frame size must be positive"));
    }
    let limit = grid.count.unwrap_or(usize::MAX);
    let mut frames = Vec::new();
    'images: for (image, surface) in images.iter().enumerate() {
        let (iw, ih) = (f64::from(surface.width()), f64::from(surface.height()));
        let mut y = grid.margin;
        while y + grid.height <= ih - grid.margin {
            let mut x = grid.margin;
            while x + grid.width <= iw - grid.margin {
                if frames.len() >= limit {
                    break 'images;
                }
                frames.push(SpriteFrame {
                    image,
                    rect: Rect::new(x, y, x + grid.width, y + grid.height),
                    reg_x: grid.reg_x,
                    reg_y: grid.reg_y,
                });
                x += grid.width + grid.spacing;
            }
            y += grid.height + grid.spacing;
        }
    }
    Ok(frames)
}

fn resolve_animation(name: &str, def: &AnimationDef) -> FlitterResult<SpriteAnimation> {
    let (frames, next, speed) = match def {
        AnimationDef::Frame(i) => (vec![*i], None, None),
        AnimationDef::Range(parts) => {
            let index = |i: usize| -> FlitterResult<usize> {
                parts
                    .get(i)
                    .and_then(serde_json::Value::as_u64)
                    .map(|v| v as usize)
                    .ok_or_else(|| {
                        FlitterError::validation(format!("animation '{name}': bad frame range"))
                    })
            };
            let start = index(0)?;
            if parts.len() == 1 {
                (vec![start], None, None)
            } else {
                let end = index(1)?;
                if end < start {
                    return Err(FlitterError::validation(format!(
                        "animation '{name}': range end {end} before start {start}"
                    )));
                }
                let next = match parts.get(2) {
                    Some(serde_json::Value::String(s)) => Some(NextDef::Name(s.clone())),
                    Some(serde_json::Value::Bool(b)) => Some(NextDef::Flag(*b)),
                    _ => None,
                };
                let speed = parts.get(3).and_then(serde_json::Value::as_f64);
                ((start..=end).collect(), next, speed)
            }
        }
        AnimationDef::Sequence {
            frames,
            next,
            speed,
        } => (frames.clone(), next.clone(), *speed),
    };
    if frames.is_empty() {
        return Err(FlitterError::validation(format!(
            "animation '{name}' has no frames"
        )));
    }

    // Absent or `true` loops the animation; `false` (or looping a single frame) stops.
    let next = match next {
        None | Some(NextDef::Flag(true)) => Some(name.to_owned()),
        Some(NextDef::Flag(false)) => None,
        Some(NextDef::Name(n)) => Some(n),
    }
    .filter(|n| !(frames.len() < 2 && n == name));

    let speed = speed.filter(|s| *s > 0.0).unwrap_or(1.0);
    Ok(SpriteAnimation {
        frames,
        next,
        speed,
    })
}

/// A frame-animated leaf driven by a [`SpriteSheet`].
#[derive(Debug)]
pub struct Sprite {
    sheet: Arc<SpriteSheet>,
    animation: Option<String>,
    cursor: f64,
    current: usize,
    paused: bool,
    last_time: Option<f64>,
    completed: u32,
}

impl Sprite {
    /// A stopped sprite showing frame 0.
    pub fn new(sheet: Arc<SpriteSheet>) -> Self {
        Self {
            sheet,
            animation: None,
            cursor: 0.0,
            current: 0,
            paused: true,
            last_time: None,
            completed: 0,
        }
    }

    pub fn sheet(&self) -> &Arc<SpriteSheet> {
        &self.sheet
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Active animation, if playing a named one.
    pub fn current_animation(&self) -> Option<&str> {
        self.animation.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Number of times an animation ran off its end.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn frame(&self) -> Option<&SpriteFrame> {
        self.sheet.frame(self.current)
    }

    pub fn local_bounds(&self) -> BoundingBox {
        self.frame()
            .map(SpriteFrame::local_bounds)
            .unwrap_or(BoundingBox::EMPTY)
    }

    /// Pixel-alpha hit test of a local point against the current frame.
    pub fn hit_test(&self, p: Point) -> bool {
        let Some(frame) = self.frame() else {
            return false;
        };
        let Some(image) = self.sheet.image(frame.image) else {
            return false;
        };
        frame.local_bounds().contains(p)
            && image.alpha_at(
                (frame.rect.x0 + p.x + frame.reg_x).floor() as i64,
                (frame.rect.y0 + p.y + frame.reg_y).floor() as i64,
            ) > 0
    }

    pub fn goto_and_play(&mut self, target: impl Into<FrameTarget>) -> FlitterResult<()> {
        self.goto(target.into())?;
        self.paused = false;
        Ok(())
    }

    pub fn goto_and_stop(&mut self, target: impl Into<FrameTarget>) -> FlitterResult<()> {
        self.goto(target.into())?;
        self.paused = true;
        Ok(())
    }

    fn goto(&mut self, target: FrameTarget) -> FlitterResult<()> {
        match target {
            FrameTarget::Label(name) => {
                let anim = self.sheet.animation(&name).ok_or_else(|| {
                    FlitterError::animation(format!("unknown sprite animation '{name}'"))
                })?;
                self.current = anim.frames[0];
                self.animation = Some(name);
            }
            FrameTarget::Frame(frame) => {
                let index = frame.max(0.0).floor() as usize;
                if index >= self.sheet.frame_count() {
                    return Err(FlitterError::animation(format!(
                        "sprite frame {index} out of range ({})",
                        self.sheet.frame_count()
                    )));
                }
                self.current = index;
                self.animation = None;
            }
        }
        self.cursor = match self.animation {
            Some(_) => 0.0,
            None => self.current as f64,
        };
        Ok(())
    }

    /// Advance by `frames` ticks, scaled by the animation speed.
    pub fn advance(&mut self, frames: f64) {
        if self.paused || frames <= 0.0 {
            return;
        }
        let Some(name) = self.animation.clone() else {
            let count = self.sheet.frame_count() as f64;
            self.cursor = (self.cursor + frames).rem_euclid(count);
            self.current = self.cursor as usize;
            return;
        };
        let mut name = name;
        let Some(mut anim) = self.sheet.animation(&name).cloned() else {
            return;
        };
        self.cursor += frames * anim.speed;
        loop {
            let len = anim.frames.len() as f64;
            if self.cursor < len {
                break;
            }
            self.completed += 1;
            match anim.next.clone().and_then(|n| {
                let next = self.sheet.animation(&n).cloned()?;
                Some((n, next))
            }) {
                Some((next_name, next)) => {
                    self.cursor -= len;
                    name = next_name;
                    anim = next;
                }
                None => {
                    self.cursor = len - 1.0;
                    self.paused = true;
                    break;
                }
            }
        }
        self.current = anim.frames[self.cursor as usize];
        self.animation = Some(name);
    }

    /// Advance one frame per distinct tick time. The first tick only records the time.
    pub fn tick(&mut self, time: f64) {
        match self.last_time {
            Some(last) if last == time => {}
            Some(_) => {
                self.last_time = Some(time);
                self.advance(1.0);
            }
            None => self.last_time = Some(time),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/sprite.rs"]
mod tests;
