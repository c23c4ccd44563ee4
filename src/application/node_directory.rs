// Node directory trait - lookups the traceroute service needs
use crate::domain::node::NodeInfo;
use crate::domain::route_discovery::HopId;

pub trait NodeDirectory: Send + Sync {
    /// Name shown in traceroute reports. Unknown nodes get a placeholder, never an error.
    fn display_name(&self, num: HopId) -> String;

    /// Best-effort fuzzy lookup used to rebuild map paths from report text.
    /// The first matching node in directory order wins.
    fn find_by_name_contains(&self, text: &str) -> Option<NodeInfo>;

    /// All known nodes, in directory order
    fn list_nodes(&self) -> Vec<NodeInfo>;
}
