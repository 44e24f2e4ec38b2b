//! Row-block scheduling for parallel rendering.
//!
//! The image is cut into contiguous blocks of scan rows. Each block owns a
//! disjoint slice of the output buffer, so workers write without locking.
//! The block count depends only on the image height, never on the number
//! of workers, which keeps the image identical for any thread count.

use std::collections::VecDeque;
use std::thread::{self, ScopedJoinHandle};

use rayon::prelude::*;

use crate::renderer::render_rows;
use crate::{Camera, Hittable, RenderConfig, RenderError, RenderResult};

/// A run of consecutive scan rows rendered as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBlock {
    /// First scan row (counted from the bottom of the image)
    pub start: u32,
    /// Number of rows in the block
    pub span: u32,
    /// Position of this block in dispatch order
    pub index: usize,
}

impl RowBlock {
    /// Create a new block.
    pub fn new(start: u32, span: u32, index: usize) -> Self {
        Self { start, span, index }
    }

    /// Get the total number of pixels in this block.
    pub fn pixel_count(&self, width: u32) -> usize {
        self.span as usize * width as usize
    }
}

/// Default number of blocks the image height is divided into.
pub const DEFAULT_BLOCK_DIVISOR: u32 = 32;

/// How row blocks are spread over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Every block in order on the calling thread
    Serial,
    /// One thread per block, at most `workers` alive; the oldest is joined
    /// before the next block is dispatched
    Fifo { workers: usize },
    /// Blocks handed to a dedicated rayon pool of `workers` threads
    Pool { workers: usize },
}

impl Dispatch {
    /// Number of threads that may render at once.
    pub fn workers(&self) -> usize {
        match *self {
            Dispatch::Serial => 1,
            Dispatch::Fifo { workers } | Dispatch::Pool { workers } => workers,
        }
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Dispatch::Fifo { workers: 2 }
    }
}

/// Split `height` scan rows into blocks of `height / divisor` rows.
///
/// Blocks are at least one row tall; the last block is shorter when the
/// rows do not divide evenly. Blocks come back in scan order.
pub fn generate_blocks(height: u32, divisor: u32) -> Vec<RowBlock> {
    let block_size = (height / divisor.max(1)).max(1);
    let mut blocks = Vec::with_capacity(height.div_ceil(block_size) as usize);

    let mut start = 0;
    while start < height {
        let span = block_size.min(height - start);
        blocks.push(RowBlock::new(start, span, blocks.len()));
        start += span;
    }

    blocks
}

/// Pair every block with its slice of the output image.
///
/// Scan row 0 is the bottom image row, so the first block owns the tail of
/// the buffer and each later block the part just before it.
fn split_output<'a>(
    blocks: &[RowBlock],
    width: u32,
    out: &'a mut [u8],
) -> Vec<(RowBlock, &'a mut [u8])> {
    let mut rest = out;
    let mut jobs = Vec::with_capacity(blocks.len());

    for block in blocks {
        let remaining = std::mem::take(&mut rest);
        let split = remaining.len() - block.pixel_count(width);
        let (head, tail) = remaining.split_at_mut(split);
        jobs.push((*block, tail));
        rest = head;
    }
    debug_assert!(rest.is_empty());

    jobs
}

/// Render a single block into its output slice.
pub fn render_block(
    world: &dyn Hittable,
    camera: &Camera,
    config: &RenderConfig,
    block: &RowBlock,
    rows: &mut [u8],
) {
    render_rows(world, camera, config, block.start, rows);
    log::debug!(
        "Block {} done (rows {}..{})",
        block.index,
        block.start,
        block.start + block.span
    );
}

/// Render every block into `out` using the configured dispatch.
///
/// `blocks` must come from [`generate_blocks`] for the configured height and
/// `out` must hold exactly `width * height` bytes.
pub fn render_blocks(
    world: &dyn Hittable,
    camera: &Camera,
    config: &RenderConfig,
    blocks: &[RowBlock],
    out: &mut [u8],
) -> RenderResult<()> {
    let jobs = split_output(blocks, config.width, out);

    match config.dispatch {
        Dispatch::Serial => {
            for (block, rows) in jobs {
                render_block(world, camera, config, &block, rows);
            }
            Ok(())
        }
        Dispatch::Fifo { workers } => dispatch_fifo(world, camera, config, jobs, workers),
        Dispatch::Pool { workers } => dispatch_pool(world, camera, config, jobs, workers),
    }
}

fn join_block(block: usize, handle: ScopedJoinHandle<'_, ()>) -> RenderResult<()> {
    handle
        .join()
        .map_err(|_| RenderError::WorkerPanicked { block })
}

/// Bounded FIFO dispatch over scoped threads.
///
/// Keeps at most `workers` blocks in flight. When the budget is used up the
/// oldest outstanding block is joined first, even if a later one finished
/// earlier. On the first failure no further blocks are dispatched, but every
/// started worker is still joined.
fn dispatch_fifo(
    world: &dyn Hittable,
    camera: &Camera,
    config: &RenderConfig,
    jobs: Vec<(RowBlock, &mut [u8])>,
    workers: usize,
) -> RenderResult<()> {
    thread::scope(|scope| {
        let mut in_flight = VecDeque::with_capacity(workers);
        let mut result = Ok(());

        for (block, rows) in jobs {
            if in_flight.len() >= workers {
                if let Some((index, handle)) = in_flight.pop_front() {
                    result = result.and(join_block(index, handle));
                }
            }
            if result.is_err() {
                break;
            }

            let spawned = thread::Builder::new()
                .name(format!("flake-block-{}", block.index))
                .spawn_scoped(scope, move || {
                    render_block(world, camera, config, &block, rows)
                });
            match spawned {
                Ok(handle) => in_flight.push_back((block.index, handle)),
                Err(err) => {
                    result = Err(RenderError::Spawn(err));
                    break;
                }
            }
        }

        while let Some((index, handle)) = in_flight.pop_front() {
            result = result.and(join_block(index, handle));
        }
        result
    })
}

/// Work-stealing dispatch on a dedicated rayon pool.
fn dispatch_pool(
    world: &dyn Hittable,
    camera: &Camera,
    config: &RenderConfig,
    jobs: Vec<(RowBlock, &mut [u8])>,
    workers: usize,
) -> RenderResult<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("flake-pool-{i}"))
        .build()?;

    pool.install(|| {
        jobs.into_par_iter().for_each(|(block, rows)| {
            render_block(world, camera, config, &block, rows);
        });
    });

    Ok(())
}
