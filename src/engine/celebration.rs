/// Whether today's new-word count crossed a goal multiple that has not been
/// celebrated yet. A target of 0 means no goal.
pub fn should_celebrate(target: u32, today: u32, last_celebrated: u32) -> bool {
    target > 0 && today > 0 && today % target == 0 && today > last_celebrated
}
