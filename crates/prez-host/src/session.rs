//! A running guest: one module instance plus its bridge state.
//!
//! The session is the single thread of control the bridge assumes.  Host
//! input, load completions and frame ticks all enter through `&mut self`, so
//! none of them can overlap with each other or with guest execution.

use prez_types::Event;
use wasmi::{Engine, Instance, Linker, Memory, Module, Store};

use crate::clock::{Clock, SystemClock};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, SessionError, SessionResult};
use crate::imports;
use crate::input::{translate, Disposition, HostInput, Translation};
use crate::loader::{FsImageLoader, ImageLoader};
use crate::memory::GuestMemory;
use crate::ring::PushOutcome;
use crate::state::BridgeState;
use crate::surface::{HeadlessPage, Page, Viewport};

/// What one [`Session::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// Image loads recorded this tick.
    pub completed_loads: usize,
    /// Whether the frame export was called.
    pub frame_ran: bool,
}

/// Assembles a [`Session`].  Anything not supplied gets a default: a
/// headless page with no placeholders, a filesystem loader rooted at the
/// config's `asset_root`, and the system clock.
pub struct SessionBuilder {
    config: BridgeConfig,
    page: Option<Box<dyn Page>>,
    loader: Option<Box<dyn ImageLoader>>,
    clock: Option<Box<dyn Clock>>,
}

impl SessionBuilder {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            page: None,
            loader: None,
            clock: None,
        }
    }

    /// Use `page` for surface placeholders.  Its viewport wins over the
    /// config's.
    pub fn page(mut self, page: impl Page + 'static) -> Self {
        self.page = Some(Box::new(page));
        self
    }

    pub fn loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Compile and instantiate `wasm`, running its start function if any.
    pub fn build(self, wasm: &[u8]) -> SessionResult<Session> {
        let config = self.config;
        let page = self
            .page
            .unwrap_or_else(|| Box::new(HeadlessPage::new(config.viewport)));
        let loader = self
            .loader
            .unwrap_or_else(|| Box::new(FsImageLoader::new(config.asset_root.clone())));
        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock::new()));

        let mut engine_config = wasmi::Config::default();
        engine_config.consume_fuel(config.fuel_per_call.is_some());
        let engine = Engine::new(&engine_config);
        let module = Module::new(&engine, wasm)?;

        let state = BridgeState::new(config.memory_export.clone(), page, loader, clock);
        let mut store = Store::new(&engine, state);
        let mut linker = <Linker<BridgeState>>::new(&engine);
        imports::register(&mut linker)?;

        if let Some(fuel) = config.fuel_per_call {
            store.set_fuel(fuel)?;
        }
        let instance = linker.instantiate(&mut store, &module)?.start(&mut store)?;
        let memory = instance
            .get_memory(&store, &config.memory_export)
            .ok_or_else(|| BridgeError::MissingMemory(config.memory_export.clone()))?;

        tracing::debug!(
            target: "prez::session",
            bytes = wasm.len(),
            memory = %config.memory_export,
            "guest instantiated"
        );

        Ok(Session {
            store,
            instance,
            memory,
            config,
        })
    }
}

pub struct Session {
    store: Store<BridgeState>,
    instance: Instance,
    memory: Memory,
    config: BridgeConfig,
}

impl Session {
    pub fn builder(config: BridgeConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn state(&self) -> &BridgeState {
        self.store.data()
    }

    /// The guest's linear memory as it is right now.
    pub fn memory(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    /// Mutable guest memory, for embedders that act as the guest's consumer.
    pub fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    /// Call the entry export once.
    pub fn run_entry(&mut self) -> SessionResult<()> {
        let name = self.config.entry_export.clone();
        self.call_export(&name)
    }

    /// Forward one host input notification to the guest's Event Buffer.
    pub fn dispatch_input(&mut self, input: HostInput) -> SessionResult<Disposition> {
        let event = match translate(&input) {
            Translation::Deliver(event) => event,
            Translation::Filter => return Ok(Disposition::Filtered),
            Translation::PreventDefault => return Ok(Disposition::PreventDefault),
        };

        if let Event::Resize { width, height } = event {
            self.store
                .data_mut()
                .canvas
                .set_viewport(Viewport { width, height });
        }

        let (data, state) = self.memory.data_and_store_mut(&mut self.store);
        let disposition = match state.deliver(&mut GuestMemory::new(data), &event)? {
            None => Disposition::Ignored,
            Some(PushOutcome::Dropped) => Disposition::Dropped,
            Some(PushOutcome::Written { .. } | PushOutcome::Truncated { .. }) => {
                Disposition::Forwarded
            }
        };
        tracing::trace!(target: "prez::session", kind = event.kind(), ?disposition, "input dispatched");
        Ok(disposition)
    }

    /// One display refresh: record finished image loads, then run the frame
    /// export if the guest started its loop.
    ///
    /// A load that cannot be announced fails the tick, but the whole batch
    /// is recorded first, so later ticks see every handle's final state.
    pub fn tick(&mut self) -> SessionResult<TickOutcome> {
        let finished = self.store.data_mut().loader.poll();
        let completed_loads = finished.len();
        if !finished.is_empty() {
            let (data, state) = self.memory.data_and_store_mut(&mut self.store);
            state.complete_loads(&mut GuestMemory::new(data), finished)?;
        }

        let frame_ran = self.store.data().frames.is_running();
        if frame_ran {
            let name = self.config.frame_export.clone();
            self.call_export(&name)?;
            self.store.data_mut().frames.record_frame();
        }

        Ok(TickOutcome {
            completed_loads,
            frame_ran,
        })
    }

    fn call_export(&mut self, name: &str) -> SessionResult<()> {
        let func = self
            .instance
            .get_typed_func::<(), ()>(&self.store, name)
            .map_err(|_| SessionError::MissingExport(name.to_string()))?;
        if let Some(fuel) = self.config.fuel_per_call {
            self.store.set_fuel(fuel)?;
        }
        func.call(&mut self.store, ()).map_err(|err| {
            tracing::warn!(target: "prez::session", export = name, error = %err, "guest call failed");
            SessionError::from(err)
        })
    }
}
