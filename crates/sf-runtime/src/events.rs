//! Scan lifecycle dispatch.

use sf_modules::{ScanContext, ScanListener};

use crate::module_crate::ModuleCrate;

/// The three scan phases listeners hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    ScanStart,
    ProcessingStart,
    ScanEnd,
}

/// External listeners plus the crates whose modules listen.
///
/// External listeners are called first, in registration order, then
/// listening modules in execution order.
pub(crate) struct Dispatcher {
    external: Vec<Box<dyn ScanListener + Send>>,
    modules: Vec<usize>,
}

impl Dispatcher {
    pub(crate) fn new(
        external: Vec<Box<dyn ScanListener + Send>>,
        crates: &mut [ModuleCrate],
    ) -> Self {
        let modules = crates
            .iter_mut()
            .enumerate()
            .filter_map(|(i, c)| c.module_mut().base_mut().as_listener().map(|_| i))
            .collect();
        Self { external, modules }
    }

    pub(crate) fn len(&self) -> usize {
        self.external.len() + self.modules.len()
    }

    pub(crate) fn fire(&mut self, phase: Phase, crates: &mut [ModuleCrate], ctx: &ScanContext) {
        for listener in &mut self.external {
            notify(listener.as_mut(), phase, ctx);
        }
        for &i in &self.modules {
            if let Some(listener) = crates[i].module_mut().base_mut().as_listener() {
                notify(listener, phase, ctx);
            }
        }
    }
}

fn notify(listener: &mut dyn ScanListener, phase: Phase, ctx: &ScanContext) {
    match phase {
        Phase::ScanStart => listener.scan_start(ctx),
        Phase::ProcessingStart => listener.processing_start(ctx),
        Phase::ScanEnd => listener.scan_end(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_graph::IoMap;
    use sf_modules::{Console, Module, Negate};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    struct Log(Arc<Mutex<Vec<String>>>, &'static str);

    impl ScanListener for Log {
        fn scan_start(&mut self, ctx: &ScanContext) {
            self.0.lock().unwrap().push(format!("{} start {}", self.1, ctx.scan));
        }

        fn scan_end(&mut self, ctx: &ScanContext) {
            self.0.lock().unwrap().push(format!("{} end {}", self.1, ctx.scan));
        }
    }

    #[test]
    fn external_listeners_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let empty = IoMap::empty;
        let mut crates = vec![
            ModuleCrate::new("flip", Module::transform(Negate), empty(), empty()).unwrap(),
            ModuleCrate::new("log", Module::sink(Console::new()), empty(), empty()).unwrap(),
        ];
        let external: Vec<Box<dyn ScanListener + Send>> = vec![
            Box::new(Log(log.clone(), "first")),
            Box::new(Log(log.clone(), "second")),
        ];
        let mut d = Dispatcher::new(external, &mut crates);
        assert_eq!(d.len(), 3);

        let ctx = ScanContext {
            scan: 1,
            started: Instant::now(),
        };
        d.fire(Phase::ScanStart, &mut crates, &ctx);
        d.fire(Phase::ProcessingStart, &mut crates, &ctx);
        d.fire(Phase::ScanEnd, &mut crates, &ctx);
        assert_eq!(
            *log.lock().unwrap(),
            ["first start 1", "second start 1", "first end 1", "second end 1"]
        );
    }
}
