//! Host-based integration tests for the edge watcher and the periodic
//! UDP beacon

#[cfg(test)]
mod async_tests;
#[cfg(test)]
mod edge_watch_tests;
#[cfg(test)]
mod property_tests;
