//! Guest import table.
//!
//! | module   | import             | signature                                  |
//! |----------|--------------------|--------------------------------------------|
//! | `host`   | `print_str`        | `(ptr, len)`                               |
//! | `host`   | `exit`             | `(status)`                                 |
//! | `host`   | `start_loop`       | `()`                                       |
//! | `canvas` | `init`             | `(ptr, len) -> i32`                        |
//! | `canvas` | `clear`            | `(c, r, g, b, a)`                          |
//! | `canvas` | `fill_rect`        | `(c, x, y, w, h, r, g, b, a)`              |
//! | `canvas` | `fill_text`        | `(c, ptr, len, x, y, max_width)`           |
//! | `canvas` | `set_font`         | `(c, ptr, len)`                            |
//! | `canvas` | `set_color`        | `(c, r, g, b, a)`                          |
//! | `canvas` | `measure_text`     | `(c, ptr, len, out)`                       |
//! | `canvas` | `draw_image`       | `(c, handle, x, y, w, h)`                  |
//! | `canvas` | `get_width`        | `(c) -> i32`                               |
//! | `canvas` | `get_height`       | `(c) -> i32`                               |
//! | `canvas` | `set_size`         | `(c, w, h)`                                |
//! | `input`  | `setup`            | `(header_addr, event_size)`                |
//! | `assets` | `load_image`       | `(ptr, len, out)`                          |
//! | `assets` | `store_image_size` | `(out)`                                    |
//!
//! Addresses, lengths and sizes are `i32` on the wire and read as unsigned.
//! Coordinates and colour channels are `f32`.  `c` is the surface token,
//! which is ignored.

use prez_types::layout::{IMAGE_OUT_HANDLE, IMAGE_OUT_HEIGHT, IMAGE_OUT_WIDTH};
use wasmi::errors::LinkerError;
use wasmi::{Caller, Extern, Linker};

use crate::error::{BridgeError, BridgeResult};
use crate::memory::GuestMemory;
use crate::state::BridgeState;
use crate::strings::decode_utf8;
use crate::surface::Rect;

/// Bytes of the `load_image` / `store_image_size` output block.
const IMAGE_OUT_BYTES: u32 = 12;

type HostResult<T> = Result<T, wasmi::Error>;

/// Turn a boundary violation into a trap that unwinds the guest call.
fn trap(err: BridgeError) -> wasmi::Error {
    tracing::error!(target: "prez::guest", error = %err, "boundary violation; trapping");
    wasmi::Error::host(err)
}

/// Run `f` against the guest's live memory and the bridge state.
///
/// The memory is looked up on every call because the guest may have grown
/// it since the last one.
fn with_memory<R>(
    caller: &mut Caller<'_, BridgeState>,
    f: impl FnOnce(&mut GuestMemory<'_>, &mut BridgeState) -> BridgeResult<R>,
) -> HostResult<R> {
    let memory = caller
        .get_export(&caller.data().memory_export)
        .and_then(Extern::into_memory);
    let memory = match memory {
        Some(memory) => memory,
        None => {
            let name = caller.data().memory_export.clone();
            return Err(trap(BridgeError::MissingMemory(name)));
        }
    };
    let (data, state) = memory.data_and_store_mut(&mut *caller);
    f(&mut GuestMemory::new(data), state).map_err(trap)
}

fn with_state<R>(
    caller: &mut Caller<'_, BridgeState>,
    f: impl FnOnce(&mut BridgeState) -> BridgeResult<R>,
) -> HostResult<R> {
    f(caller.data_mut()).map_err(trap)
}

pub fn register(linker: &mut Linker<BridgeState>) -> Result<(), LinkerError> {
    register_host(linker)?;
    register_canvas(linker)?;
    register_input(linker)?;
    register_assets(linker)?;
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// host
// ══════════════════════════════════════════════════════════════════════════════

fn register_host(linker: &mut Linker<BridgeState>) -> Result<(), LinkerError> {
    linker.func_wrap(
        "host",
        "print_str",
        |mut caller: Caller<'_, BridgeState>, ptr: u32, len: u32| -> HostResult<()> {
            with_memory(&mut caller, |mem, state| {
                let text = decode_utf8(mem, ptr, len)?;
                state.print(text);
                Ok(())
            })
        },
    )?;

    linker.func_wrap(
        "host",
        "exit",
        |mut caller: Caller<'_, BridgeState>, status: i32| {
            caller.data_mut().request_exit(status);
        },
    )?;

    linker.func_wrap(
        "host",
        "start_loop",
        |mut caller: Caller<'_, BridgeState>| {
            caller.data_mut().frames.start();
        },
    )?;

    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// canvas
// ══════════════════════════════════════════════════════════════════════════════

fn register_canvas(linker: &mut Linker<BridgeState>) -> Result<(), LinkerError> {
    linker.func_wrap(
        "canvas",
        "init",
        |mut caller: Caller<'_, BridgeState>, ptr: u32, len: u32| -> HostResult<i32> {
            with_memory(&mut caller, |mem, state| {
                let name = decode_utf8(mem, ptr, len)?;
                Ok(state.canvas.init(&name))
            })
        },
    )?;

    linker.func_wrap(
        "canvas",
        "clear",
        |mut caller: Caller<'_, BridgeState>,
         _c: i32,
         r: f32,
         g: f32,
         b: f32,
         a: f32|
         -> HostResult<()> { with_state(&mut caller, |state| state.canvas.clear(r, g, b, a)) },
    )?;

    linker.func_wrap(
        "canvas",
        "fill_rect",
        |mut caller: Caller<'_, BridgeState>,
         _c: i32,
         x: f32,
         y: f32,
         w: f32,
         h: f32,
         r: f32,
         g: f32,
         b: f32,
         a: f32|
         -> HostResult<()> {
            with_state(&mut caller, |state| {
                state.canvas.fill_rect(Rect { x, y, w, h }, r, g, b, a)
            })
        },
    )?;

    linker.func_wrap(
        "canvas",
        "fill_text",
        |mut caller: Caller<'_, BridgeState>,
         _c: i32,
         ptr: u32,
         len: u32,
         x: f32,
         y: f32,
         max_width: f32|
         -> HostResult<()> {
            with_memory(&mut caller, |mem, state| {
                let text = decode_utf8(mem, ptr, len)?;
                state.canvas.fill_text(&text, x, y, max_width)
            })
        },
    )?;

    linker.func_wrap(
        "canvas",
        "set_font",
        |mut caller: Caller<'_, BridgeState>, _c: i32, ptr: u32, len: u32| -> HostResult<()> {
            with_memory(&mut caller, |mem, state| {
                let font = decode_utf8(mem, ptr, len)?;
                state.canvas.set_font(&font);
                Ok(())
            })
        },
    )?;

    linker.func_wrap(
        "canvas",
        "set_color",
        |mut caller: Caller<'_, BridgeState>, _c: i32, r: f32, g: f32, b: f32, a: f32| {
            caller.data_mut().canvas.set_color(r, g, b, a);
        },
    )?;

    linker.func_wrap(
        "canvas",
        "measure_text",
        |mut caller: Caller<'_, BridgeState>,
         _c: i32,
         ptr: u32,
         len: u32,
         out: u32|
         -> HostResult<()> {
            with_memory(&mut caller, |mem, state| {
                let text = decode_utf8(mem, ptr, len)?;
                let metrics = state.canvas.measure_text(&text)?;
                mem.write_f32s(out, &metrics.to_array())
            })
        },
    )?;

    linker.func_wrap(
        "canvas",
        "draw_image",
        |mut caller: Caller<'_, BridgeState>,
         _c: i32,
         handle: i32,
         x: f32,
         y: f32,
         w: f32,
         h: f32|
         -> HostResult<()> {
            with_state(&mut caller, |state| {
                let image = state.images.image(handle)?;
                state.canvas.draw_image(image, Rect { x, y, w, h })
            })
        },
    )?;

    linker.func_wrap(
        "canvas",
        "get_width",
        |mut caller: Caller<'_, BridgeState>, _c: i32| -> HostResult<i32> {
            with_state(&mut caller, |state| Ok(state.canvas.width()? as i32))
        },
    )?;

    linker.func_wrap(
        "canvas",
        "get_height",
        |mut caller: Caller<'_, BridgeState>, _c: i32| -> HostResult<i32> {
            with_state(&mut caller, |state| Ok(state.canvas.height()? as i32))
        },
    )?;

    linker.func_wrap(
        "canvas",
        "set_size",
        |mut caller: Caller<'_, BridgeState>, _c: i32, w: i32, h: i32| -> HostResult<()> {
            with_state(&mut caller, |state| state.canvas.set_size(w, h))
        },
    )?;

    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// input
// ══════════════════════════════════════════════════════════════════════════════

fn register_input(linker: &mut Linker<BridgeState>) -> Result<(), LinkerError> {
    linker.func_wrap(
        "input",
        "setup",
        |mut caller: Caller<'_, BridgeState>,
         header_addr: u32,
         event_size: u32|
         -> HostResult<()> {
            with_memory(&mut caller, |mem, state| {
                state.register_ring(mem, header_addr, event_size)?;
                Ok(())
            })
        },
    )?;
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// assets
// ══════════════════════════════════════════════════════════════════════════════

fn register_assets(linker: &mut Linker<BridgeState>) -> Result<(), LinkerError> {
    linker.func_wrap(
        "assets",
        "load_image",
        |mut caller: Caller<'_, BridgeState>, ptr: u32, len: u32, out: u32| -> HostResult<()> {
            with_memory(&mut caller, |mem, state| {
                mem.range(out, IMAGE_OUT_BYTES)?;
                let source = decode_utf8(mem, ptr, len)?;
                let handle = state.begin_load(source);
                mem.write_u32(out + IMAGE_OUT_HANDLE, handle)
            })
        },
    )?;

    linker.func_wrap(
        "assets",
        "store_image_size",
        |mut caller: Caller<'_, BridgeState>, out: u32| -> HostResult<()> {
            with_memory(&mut caller, |mem, state| {
                mem.range(out, IMAGE_OUT_BYTES)?;
                let handle = mem.read_i32(out + IMAGE_OUT_HANDLE)?;
                let (width, height) = state.images.dimensions(handle)?;
                mem.write_i32(out + IMAGE_OUT_WIDTH, width)?;
                mem.write_i32(out + IMAGE_OUT_HEIGHT, height)
            })
        },
    )?;

    Ok(())
}
