// Adapters layer: concrete stores behind the ConfigStore port.

pub mod storage;
