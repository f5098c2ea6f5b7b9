mod compiler;
mod database;
mod discovery;

pub use compiler::{
    compile_hotspot_defs, parse_hotspot_defs, ContentCompileError, ContentErrorCode,
    SourceLocation,
};
pub use database::{HotspotDef, HotspotDefDatabase, HotspotDefId};
