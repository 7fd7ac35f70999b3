pub mod fetch_loop;
pub mod normalize;
pub mod pacer;
pub mod planner;
