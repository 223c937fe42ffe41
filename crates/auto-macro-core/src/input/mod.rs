mod hub;
mod injector;
mod rdev_hook;

pub use {
    hub::{CapturedInput, InputEvent, InputHub, ListenerKind, Subscription},
    injector::{EnigoInjector, InjectorFactory, InputInjector},
    rdev_hook::RdevHook,
};

#[cfg(test)]
pub(crate) use rdev_hook::normalize;
