pub mod endstop;

pub use endstop::{
    EndstopHandle, EndstopRegistry, EndstopResolver, MirroredEndstop, ScriptedEndstop, parse_pin,
};
