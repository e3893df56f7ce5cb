//! Umbrella crate that re-exports the `meshpilot-*` building blocks.
//!
//! `geom` holds the geometry predicates and the [`Polygon`](geom::Polygon) type; `nav` holds
//! the navigation mesh, obstacle manager, layers, agents and path search. Most users only need
//! the [`prelude`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "geom")]
#[cfg_attr(docsrs, doc(cfg(feature = "geom")))]
pub use meshpilot_geom as geom;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use meshpilot_nav as nav;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub mod prelude {
    pub use meshpilot_geom::{GeometryKernel, Polygon, Vec2};
    pub use meshpilot_nav::{
        AgentId, AgentProfile, Algorithm, EventKind, LayerConfig, LayerFilter, NavError,
        NavEvent, NavMesh, NavMeshConfig, PathEndpoint, PathQuery, PathResult,
    };
}
