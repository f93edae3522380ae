//! Sites, tree records and team membership

pub mod models;

pub use models::{
    Coordinates, NewSite, NewTree, Site, SiteStatus, Tree, TreeImage, TreeUpdate,
};
