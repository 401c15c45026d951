pub mod config;
pub mod error;

pub mod core {
    pub mod action;
    pub mod cluster;
    pub mod common;
    pub mod fleet;
    pub mod latency;
    pub mod observation;
    pub mod request;
    pub mod reward;
    pub mod timeline;

    pub mod placement {
        pub mod best_fit;
        pub mod engine;
        pub mod first_fit;
        pub mod interface;
    }
}

pub mod metrics {
    pub mod collector;
    pub mod printer;
    pub mod results;
}

pub mod simulation_callbacks;
pub mod simulator;

pub mod test_util {
    pub mod helpers;
}

pub mod trace {
    pub mod catalog;
    pub mod generator;
}
