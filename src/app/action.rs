#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CastVote { candidate_id: u64 },
    Quit,
}
