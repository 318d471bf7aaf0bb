pub const USER: &str = "danci.user";
pub const COURSE_ID: &str = "danci.course_id";
pub const STUDY_MODE: &str = "danci.mode";
pub const DAILY_GOAL: &str = "danci.daily_goal";
pub const TOKEN: &str = "danci.token";
pub const LAST_CELEBRATED: &str = "danci.last_celebrated";

pub const DEFAULT_DAILY_GOAL: u32 = 5;
