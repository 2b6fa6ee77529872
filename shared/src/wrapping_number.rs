const HALF_RANGE: u16 = 1 << 15;

/// Whether sequence number `s1` comes after `s2`, allowing for wrap-around.
/// Numbers exactly half the range apart count as later only when `s1 > s2`.
pub fn sequence_greater_than(s1: u16, s2: u16) -> bool {
    let distance = s1.wrapping_sub(s2);
    distance != 0 && (distance < HALF_RANGE || (distance == HALF_RANGE && s1 > s2))
}

pub fn sequence_less_than(s1: u16, s2: u16) -> bool {
    sequence_greater_than(s2, s1)
}
