//! Audio buffers exposed to scripts.
//!
//! A script's `processReplacing(block)` receives an [`AudioBlock`]. The
//! block's buffers are allocated once per plugin and only grow when the
//! host asks for more channels or frames than before.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rhai::{Array, Dynamic, Engine, FLOAT, INT};

/// Sample storage of an [`AudioBlock`].
#[derive(Debug, Default)]
pub struct BlockData {
    inputs: Vec<Vec<FLOAT>>,
    outputs: Vec<Vec<FLOAT>>,
    frames: usize,
}

impl BlockData {
    fn prepare(&mut self, num_inputs: usize, num_outputs: usize, frames: usize) {
        resize_channels(&mut self.inputs, num_inputs, frames);
        resize_channels(&mut self.outputs, num_outputs, frames);
        self.frames = frames;
    }

    /// Number of frames in the current block.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Input channel `ch`, limited to the current frame count.
    #[must_use]
    pub fn input(&self, ch: usize) -> Option<&[FLOAT]> {
        self.inputs.get(ch).map(|c| &c[..self.frames.min(c.len())])
    }

    /// Output channel `ch`, limited to the current frame count.
    #[must_use]
    pub fn output(&self, ch: usize) -> Option<&[FLOAT]> {
        self.outputs.get(ch).map(|c| &c[..self.frames.min(c.len())])
    }

    fn output_mut(&mut self, ch: usize) -> Option<&mut [FLOAT]> {
        let frames = self.frames;
        self.outputs.get_mut(ch).map(|c| {
            let n = frames.min(c.len());
            &mut c[..n]
        })
    }

    fn copy_through(&mut self) {
        let frames = self.frames;
        for (ch, out) in self.outputs.iter_mut().enumerate() {
            let len = frames.min(out.len());
            let out = &mut out[..len];
            match self.inputs.get(ch) {
                Some(input) => {
                    let n = out.len().min(input.len());
                    out[..n].copy_from_slice(&input[..n]);
                    out[n..].fill(0.0);
                },
                None => out.fill(0.0),
            }
        }
    }
}

fn resize_channels(channels: &mut Vec<Vec<FLOAT>>, count: usize, frames: usize) {
    channels.resize_with(count, Vec::new);
    for ch in channels.iter_mut() {
        if ch.len() < frames {
            ch.resize(frames, 0.0);
        }
        ch[..frames].fill(0.0);
    }
}

/// Audio buffers of one processing call, shared with the script.
#[derive(Debug, Clone, Default)]
pub struct AudioBlock(Arc<Mutex<BlockData>>);

impl AudioBlock {
    /// Create an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the block's sample storage.
    pub fn lock(&self) -> MutexGuard<'_, BlockData> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load single precision inputs and size the outputs.
    ///
    /// `frames` is limited to the shortest input channel.
    pub fn load_f32(&self, inputs: &[&[f32]], num_outputs: usize, frames: usize) {
        let frames = shortest(inputs, frames);
        let mut data = self.lock();
        data.prepare(inputs.len(), num_outputs, frames);
        for (dst, src) in data.inputs.iter_mut().zip(inputs) {
            for (d, s) in dst.iter_mut().zip(src.iter().take(frames)) {
                *d = FLOAT::from(*s);
            }
        }
    }

    /// Write the outputs back as single precision.
    #[allow(clippy::cast_possible_truncation)]
    pub fn store_f32(&self, outputs: &mut [&mut [f32]]) {
        let data = self.lock();
        for (dst, src) in outputs.iter_mut().zip(&data.outputs) {
            for (d, s) in dst.iter_mut().zip(src.iter().take(data.frames)) {
                *d = *s as f32;
            }
        }
    }

    /// Load double precision inputs and size the outputs.
    ///
    /// `frames` is limited to the shortest input channel.
    pub fn load_f64(&self, inputs: &[&[f64]], num_outputs: usize, frames: usize) {
        let frames = shortest(inputs, frames);
        let mut data = self.lock();
        data.prepare(inputs.len(), num_outputs, frames);
        for (dst, src) in data.inputs.iter_mut().zip(inputs) {
            let n = frames.min(src.len());
            dst[..n].copy_from_slice(&src[..n]);
        }
    }

    /// Write the outputs back as double precision.
    pub fn store_f64(&self, outputs: &mut [&mut [f64]]) {
        let data = self.lock();
        for (dst, src) in outputs.iter_mut().zip(&data.outputs) {
            let n = data.frames.min(dst.len()).min(src.len());
            dst[..n].copy_from_slice(&src[..n]);
        }
    }
}

fn shortest<T>(channels: &[&[T]], frames: usize) -> usize {
    channels.iter().map(|c| c.len()).fold(frames, usize::min)
}

fn index(value: INT) -> Option<usize> {
    usize::try_from(value).ok()
}

#[allow(clippy::cast_precision_loss)]
fn int_to_float(value: INT) -> FLOAT {
    value as FLOAT
}

fn as_int(value: usize) -> INT {
    INT::try_from(value).unwrap_or(INT::MAX)
}

/// Register the `AudioBlock` type and its script API on `engine`.
///
/// Out-of-range channels or frames read as `0.0` and ignore writes.
pub(crate) fn register(engine: &mut Engine) {
    engine
        .register_type_with_name::<AudioBlock>("AudioBlock")
        .register_get("frames", |b: &mut AudioBlock| as_int(b.lock().frames))
        .register_get("num_inputs", |b: &mut AudioBlock| as_int(b.lock().inputs.len()))
        .register_get("num_outputs", |b: &mut AudioBlock| as_int(b.lock().outputs.len()))
        .register_fn("input", |b: &mut AudioBlock, ch: INT, i: INT| -> FLOAT {
            let data = b.lock();
            index(ch)
                .and_then(|ch| data.input(ch))
                .zip(index(i))
                .and_then(|(c, i)| c.get(i).copied())
                .unwrap_or(0.0)
        })
        .register_fn("output", |b: &mut AudioBlock, ch: INT, i: INT| -> FLOAT {
            let data = b.lock();
            index(ch)
                .and_then(|ch| data.output(ch))
                .zip(index(i))
                .and_then(|(c, i)| c.get(i).copied())
                .unwrap_or(0.0)
        })
        .register_fn("set_output", |b: &mut AudioBlock, ch: INT, i: INT, v: FLOAT| {
            let mut data = b.lock();
            if let (Some(ch), Some(i)) = (index(ch), index(i))
                && let Some(slot) = data.output_mut(ch).and_then(|c| c.get_mut(i))
            {
                *slot = v;
            }
        })
        .register_fn("input_channel", |b: &mut AudioBlock, ch: INT| -> Array {
            let data = b.lock();
            index(ch)
                .and_then(|ch| data.input(ch))
                .map(|c| c.iter().map(|s| Dynamic::from_float(*s)).collect())
                .unwrap_or_default()
        })
        .register_fn("set_output_channel", |b: &mut AudioBlock, ch: INT, samples: Array| {
            let mut data = b.lock();
            if let Some(out) = index(ch).and_then(|ch| data.output_mut(ch)) {
                for (slot, v) in out.iter_mut().zip(samples) {
                    *slot = v
                        .as_float()
                        .or_else(|_| v.as_int().map(int_to_float))
                        .unwrap_or(0.0);
                }
            }
        })
        .register_fn("scale_output", |b: &mut AudioBlock, ch: INT, gain: FLOAT| {
            let mut data = b.lock();
            if let Some(out) = index(ch).and_then(|ch| data.output_mut(ch)) {
                for s in out {
                    *s *= gain;
                }
            }
        })
        .register_fn("copy_through", |b: &mut AudioBlock| b.lock().copy_through());
}
