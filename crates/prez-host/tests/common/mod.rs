//! Shared helpers: assemble small guest modules with `wasm-encoder` and run
//! them through a headless session.

#![allow(dead_code)]

use prez_host::{
    BridgeConfig, CommandLog, HeadlessPage, ManualClock, ManualImageLoader, ManualLoads, Session,
    Viewport,
};
use wasm_encoder::{
    CodeSection, ConstExpr, DataSection, EntityType, ExportKind, ExportSection, Function,
    FunctionSection, ImportSection, Instruction, MemorySection, MemoryType, Module, TypeSection,
    ValType,
};

// ══════════════════════════════════════════════════════════════════════════════
// Import table
// ══════════════════════════════════════════════════════════════════════════════

pub const PRINT_STR: u32 = 0;
pub const EXIT: u32 = 1;
pub const START_LOOP: u32 = 2;
pub const INIT: u32 = 3;
pub const CLEAR: u32 = 4;
pub const FILL_RECT: u32 = 5;
pub const FILL_TEXT: u32 = 6;
pub const SET_FONT: u32 = 7;
pub const SET_COLOR: u32 = 8;
pub const MEASURE_TEXT: u32 = 9;
pub const DRAW_IMAGE: u32 = 10;
pub const GET_WIDTH: u32 = 11;
pub const GET_HEIGHT: u32 = 12;
pub const SET_SIZE: u32 = 13;
pub const SETUP: u32 = 14;
pub const LOAD_IMAGE: u32 = 15;
pub const STORE_IMAGE_SIZE: u32 = 16;

const I: ValType = ValType::I32;
const F: ValType = ValType::F32;

/// `(module, name, params, results)`, in import index order.
fn import_table() -> Vec<(&'static str, &'static str, Vec<ValType>, Vec<ValType>)> {
    vec![
        ("host", "print_str", vec![I, I], vec![]),
        ("host", "exit", vec![I], vec![]),
        ("host", "start_loop", vec![], vec![]),
        ("canvas", "init", vec![I, I], vec![I]),
        ("canvas", "clear", vec![I, F, F, F, F], vec![]),
        ("canvas", "fill_rect", vec![I, F, F, F, F, F, F, F, F], vec![]),
        ("canvas", "fill_text", vec![I, I, I, F, F, F], vec![]),
        ("canvas", "set_font", vec![I, I, I], vec![]),
        ("canvas", "set_color", vec![I, F, F, F, F], vec![]),
        ("canvas", "measure_text", vec![I, I, I, I], vec![]),
        ("canvas", "draw_image", vec![I, I, F, F, F, F], vec![]),
        ("canvas", "get_width", vec![I], vec![I]),
        ("canvas", "get_height", vec![I], vec![I]),
        ("canvas", "set_size", vec![I, I, I], vec![]),
        ("input", "setup", vec![I, I], vec![]),
        ("assets", "load_image", vec![I, I, I], vec![]),
        ("assets", "store_image_size", vec![I], vec![]),
    ]
}

// ══════════════════════════════════════════════════════════════════════════════
// Guest builder
// ══════════════════════════════════════════════════════════════════════════════

/// A guest module: one memory, the full bridge import table, and any number
/// of exported `() -> ()` functions.
pub struct Guest {
    pages: u64,
    memory_export: Option<&'static str>,
    data: Vec<(u32, Vec<u8>)>,
    funcs: Vec<(&'static str, Vec<Instruction<'static>>)>,
}

impl Guest {
    pub fn new() -> Self {
        Self {
            pages: 1,
            memory_export: Some("memory"),
            data: Vec::new(),
            funcs: Vec::new(),
        }
    }

    /// Place `bytes` at `offset` at instantiation.
    pub fn data(mut self, offset: u32, bytes: impl Into<Vec<u8>>) -> Self {
        self.data.push((offset, bytes.into()));
        self
    }

    /// Export the memory under `name`, or not at all.
    pub fn memory_export(mut self, name: Option<&'static str>) -> Self {
        self.memory_export = name;
        self
    }

    /// Export a `() -> ()` function whose body is `body` (without `end`).
    pub fn func(mut self, name: &'static str, body: Vec<Instruction<'static>>) -> Self {
        self.funcs.push((name, body));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let table = import_table();
        let void_type = table.len() as u32;

        let mut types = TypeSection::new();
        for (_, _, params, results) in &table {
            types.ty().function(params.clone(), results.clone());
        }
        types.ty().function(vec![], vec![]);

        let mut imports = ImportSection::new();
        for (i, (module, name, _, _)) in table.iter().enumerate() {
            imports.import(module, name, EntityType::Function(i as u32));
        }

        let mut functions = FunctionSection::new();
        let mut code = CodeSection::new();
        let mut exports = ExportSection::new();
        for (i, (name, body)) in self.funcs.iter().enumerate() {
            functions.function(void_type);
            let mut f = Function::new(vec![]);
            for ins in body {
                f.instruction(ins);
            }
            f.instruction(&Instruction::End);
            code.function(&f);
            exports.export(name, ExportKind::Func, table.len() as u32 + i as u32);
        }

        let mut memory = MemorySection::new();
        memory.memory(MemoryType {
            minimum: self.pages,
            maximum: None,
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        if let Some(name) = self.memory_export {
            exports.export(name, ExportKind::Memory, 0);
        }

        let mut data = DataSection::new();
        for (offset, bytes) in &self.data {
            data.active(0, &ConstExpr::i32_const(*offset as i32), bytes.iter().copied());
        }

        let mut module = Module::new();
        module.section(&types);
        module.section(&imports);
        module.section(&functions);
        module.section(&memory);
        module.section(&exports);
        module.section(&code);
        module.section(&data);

        let wasm = module.finish();
        wasmparser::validate(&wasm).unwrap_or_else(|e| panic!("invalid guest module: {e}"));
        wasm
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Instruction shorthands
// ══════════════════════════════════════════════════════════════════════════════

pub fn i32c(v: i32) -> Instruction<'static> {
    Instruction::I32Const(v)
}

pub fn f32c(v: f32) -> Instruction<'static> {
    Instruction::F32Const(v)
}

pub fn call(import: u32) -> Instruction<'static> {
    Instruction::Call(import)
}

fn memarg(offset: u64) -> wasm_encoder::MemArg {
    wasm_encoder::MemArg {
        offset,
        align: 2,
        memory_index: 0,
    }
}

/// `mem[addr] = value` as a little-endian i32.
pub fn store_i32(addr: u32, value: i32) -> Vec<Instruction<'static>> {
    vec![
        i32c(addr as i32),
        i32c(value),
        Instruction::I32Store(memarg(0)),
    ]
}

/// `mem[addr] += 1`.
pub fn increment(addr: u32) -> Vec<Instruction<'static>> {
    vec![
        i32c(addr as i32),
        i32c(addr as i32),
        Instruction::I32Load(memarg(0)),
        i32c(1),
        Instruction::I32Add,
        Instruction::I32Store(memarg(0)),
    ]
}

/// Write the header of an empty Event Buffer with `capacity` slots.
pub fn format_buffer(header: u32, capacity: u32) -> Vec<Instruction<'static>> {
    let mut body = store_i32(header, 0);
    body.extend(store_i32(header + 4, 0));
    body.extend(store_i32(header + 8, capacity as i32));
    body
}

/// `canvas.init` on the string at `ptr`, result stored at `out`.
pub fn init_surface(ptr: u32, len: u32, out: u32) -> Vec<Instruction<'static>> {
    vec![
        i32c(out as i32),
        i32c(ptr as i32),
        i32c(len as i32),
        call(INIT),
        Instruction::I32Store(memarg(0)),
    ]
}

// ══════════════════════════════════════════════════════════════════════════════
// Harness
// ══════════════════════════════════════════════════════════════════════════════

/// Placeholder name every harness page offers.
pub const SURFACE: &str = "screen";

pub struct Harness {
    pub session: Session,
    pub log: CommandLog,
    pub loads: ManualLoads,
    pub clock: ManualClock,
}

pub fn harness(wasm: &[u8]) -> Harness {
    harness_with(wasm, BridgeConfig::default())
}

pub fn harness_with(wasm: &[u8], config: BridgeConfig) -> Harness {
    try_harness(wasm, config).unwrap_or_else(|e| panic!("session failed to build: {e}"))
}

pub fn try_harness(wasm: &[u8], config: BridgeConfig) -> prez_host::SessionResult<Harness> {
    let mut page = HeadlessPage::new(config.viewport);
    let log = page.add_placeholder(SURFACE);
    let (loader, loads) = ManualImageLoader::new();
    let clock = ManualClock::new(1000);
    let session = Session::builder(config)
        .page(page)
        .loader(loader)
        .clock(clock.clone())
        .build(wasm)?;
    Ok(Harness {
        session,
        log,
        loads,
        clock,
    })
}

pub fn small_viewport() -> BridgeConfig {
    BridgeConfig {
        viewport: Viewport {
            width: 320,
            height: 240,
        },
        ..BridgeConfig::default()
    }
}

/// Little-endian `u32` words of guest memory starting at `addr`.
pub fn words(memory: &[u8], addr: u32, count: usize) -> Vec<u32> {
    let start = addr as usize;
    memory[start..start + count * 4]
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub fn f32s(memory: &[u8], addr: u32, count: usize) -> Vec<f32> {
    words(memory, addr, count)
        .into_iter()
        .map(f32::from_bits)
        .collect()
}
