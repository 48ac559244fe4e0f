//! Unit test modules.

mod config_test;
mod geo_test;
mod gpx_import_test;
mod osrm_response_test;
