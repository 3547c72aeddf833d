pub mod types;
pub mod map;
pub mod maps;
pub mod navigation;
pub mod economy;
pub mod mining;
pub mod combat;
pub mod cards;
pub mod schedule;
pub mod events;
pub mod settings;
pub mod setup;
pub mod policy;
pub mod classic;
pub mod treasure;


pub use types::*;
pub use map::{GameMap, MapError, NodeDef};
pub use maps::{classic_map, TreasureMapId};
pub use navigation::{Route, RouteId};
pub use settings::{ClassicSettings, LobbyPlayer, SetupError, TreasureSettings};
pub use policy::{ClassicPolicy, TreasurePolicy};
pub use classic::{ClassicGame, ClassicPhase, ClassicState};
pub use treasure::{TreasureGame, TreasurePhase, TreasureState};
