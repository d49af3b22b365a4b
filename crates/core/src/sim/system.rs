//! Whole-machine assembly and the dual-processor run loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use serde::Serialize;
use tracing::info;

use crate::arch::Psd;
use crate::arch::scratchpad::{SP_BOOT_DEVICE, SP_CACHED_PSD2, SP_IDENTITY};
use crate::config::Config;
use crate::coord::{ContextId, Mailbox, MailboxCounters};
use crate::exec::Context;
use crate::io::{IoChannel, NullIo};
use crate::mem::MainMemory;
use crate::mmu::{Mmu, MmuStats};
use crate::stats::Counters;

/// Final state of one context, serializable for the harness report.
#[derive(Clone, Debug, Serialize)]
pub struct ContextReport {
    /// Which processor.
    pub context: ContextId,
    /// Stop reason, rendered.
    pub stop: String,
    /// Activity counters.
    pub counters: Counters,
    /// Translator counters.
    pub mmu: MmuStats,
}

/// Result of a whole-machine run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// Primary processor.
    pub cpu: ContextReport,
    /// Companion processor, when configured.
    pub ipu: Option<ContextReport>,
    /// Mailbox traffic.
    pub mailbox: MailboxCounters,
}

/// The assembled machine: shared resources plus the immutable
/// configuration. Contexts are built on demand so tests can drive a single
/// processor directly; [`System::run`] drives both.
pub struct System {
    config: Config,
    memory: Arc<MainMemory>,
    mailbox: Arc<Mailbox>,
    stopping: Arc<AtomicBool>,
    io: Arc<dyn IoChannel>,
}

impl System {
    /// Builds a machine from `config` with no channel devices.
    pub fn new(config: Config) -> Self {
        Self::with_io(config, Arc::new(NullIo))
    }

    /// Builds a machine with an external channel controller.
    pub fn with_io(config: Config, io: Arc<dyn IoChannel>) -> Self {
        let memory = Arc::new(MainMemory::new(config.memory.size));
        Self {
            config,
            memory,
            mailbox: Arc::new(Mailbox::new()),
            stopping: Arc::new(AtomicBool::new(false)),
            io,
        }
    }

    /// The machine configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Shared main memory, for the loader and tests.
    pub fn memory(&self) -> &MainMemory {
        &self.memory
    }

    /// The signal mailbox, for harness-raised attention signals.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Requests that every context stop at its next loop iteration.
    pub fn request_stop(&self) {
        self.stopping.store(true, Ordering::Relaxed);
        self.mailbox.notify_shutdown();
    }

    /// Builds a booted context for `id`.
    ///
    /// Both contexts boot with the configured PSD; the identity scratchpad
    /// word distinguishes them.
    pub fn context(&self, id: ContextId) -> Context {
        let model = self.config.model;
        let mut ctx = Context::new(
            id,
            Mmu::new(model),
            Arc::clone(&self.memory),
            Arc::clone(&self.mailbox),
            Arc::clone(&self.io),
            Arc::clone(&self.stopping),
            self.config.halt_trap,
            self.config.trace,
        );
        let boot = self.config.boot;
        ctx.psd = Psd::new(boot.psd1, boot.psd2);
        ctx.scratchpad.write(SP_BOOT_DEVICE, boot.boot_device);
        ctx.scratchpad.write(SP_CACHED_PSD2, boot.psd2);
        ctx.scratchpad
            .write(SP_IDENTITY, (model.id() << 8) | id.index() as u32);
        ctx
    }

    /// Runs the machine to completion.
    ///
    /// The primary context runs on the calling thread; the companion, when
    /// configured, on a scoped thread. When the primary stops, the shared
    /// stopping flag brings the companion down, so the report always
    /// contains both final states.
    pub fn run(&self) -> RunReport {
        info!(model = ?self.config.model, ipu = self.config.ipu, "machine starting");

        let mut cpu = self.context(ContextId::Cpu);
        if !self.config.ipu {
            let cpu_stop = cpu.run();
            self.request_stop();
            return RunReport {
                cpu: Self::report_for(&cpu, &cpu_stop),
                ipu: None,
                mailbox: self.mailbox.counters(),
            };
        }

        let ipu = self.context(ContextId::Ipu);
        let (cpu_stop, ipu, ipu_stop) = thread::scope(|scope| {
            let handle = scope.spawn(move || {
                let mut ipu = ipu;
                let stop = ipu.run();
                (ipu, stop)
            });
            let cpu_stop = cpu.run();
            self.request_stop();
            let (ipu, ipu_stop) = handle
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (cpu_stop, ipu, ipu_stop)
        });

        RunReport {
            cpu: Self::report_for(&cpu, &cpu_stop),
            ipu: Some(Self::report_for(&ipu, &ipu_stop)),
            mailbox: self.mailbox.counters(),
        }
    }

    fn report_for(ctx: &Context, stop: &crate::common::StopReason) -> ContextReport {
        ContextReport {
            context: ctx.id(),
            stop: stop.to_string(),
            counters: ctx.counters,
            mmu: ctx.mmu.stats.clone(),
        }
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
