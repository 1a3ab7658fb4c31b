//! Global constants for rk-core

/// Root of the object type hierarchy; every object derives from it
pub const BASE_TYPE: &str = "DocumentObject";

/// Objects carrying geometry with addressable elements
pub const GEO_FEATURE_TYPE: &str = "GeoFeature";

/// Containers grouping child objects
pub const GROUP_TYPE: &str = "Group";

/// Objects redirecting to another (possibly external) object
pub const LINK_TYPE: &str = "Link";

/// Separator between segments of a sub-element path
pub const SUB_NAME_SEPARATOR: char = '.';

/// Maximum number of link hops followed before a chain is treated as cyclic
pub const MAX_LINK_DEPTH: usize = 64;
