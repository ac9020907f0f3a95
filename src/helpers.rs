/*---------------------------------------------------------------------------------------------
 *  Copyright (c) Microsoft Corporation. All rights reserved.
 *  Licensed under the Apache License, Version 2.0. See LICENSE.txt in the project root for license information.
 *  This software incorporates material from third parties. See NOTICE.txt for details.
 *--------------------------------------------------------------------------------------------*/

/// sign-extends the `s` magnitude bits read from the stream into the coefficient
/// they represent. Values with the top bit clear are negative.
#[inline(always)]
pub const fn devli(s: u8, value: u16) -> i16 {
    if s == 0 {
        value as i16
    } else if value < (1 << (s as u16 - 1)) {
        value as i16 + (-1 << s as i16) + 1
    } else {
        value as i16
    }
}

#[inline(always)]
pub const fn b_short(v1: u8, v2: u8) -> u16 {
    ((v1 as u16) << 8) + v2 as u16
}

/// low nibble
#[inline(always)]
pub const fn rbits(c: u8, n: usize) -> u8 {
    return c & (0xFF >> (8 - n));
}

/// high nibble
#[inline(always)]
pub const fn lbits(c: u8, n: usize) -> u8 {
    return c >> (8 - n);
}

#[inline(always)]
pub fn clamp_to_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[cfg(test)]
pub fn get_rand_from_seed(seed: [u8; 32]) -> rand_chacha::ChaCha12Rng {
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    ChaCha12Rng::from_seed(seed)
}

#[test]
fn test_devli() {
    // category 0 is always zero
    assert_eq!(devli(0, 0), 0);

    // category 1 codes -1 and 1
    assert_eq!(devli(1, 0), -1);
    assert_eq!(devli(1, 1), 1);

    // category 3 codes -7..-4 and 4..7
    assert_eq!(devli(3, 0b000), -7);
    assert_eq!(devli(3, 0b011), -4);
    assert_eq!(devli(3, 0b100), 4);
    assert_eq!(devli(3, 0b111), 7);

    // largest DC category
    assert_eq!(devli(11, 0), -2047);
    assert_eq!(devli(11, 2047), 2047);
}

#[test]
fn test_nibbles() {
    assert_eq!(lbits(0xA7, 4), 0xA);
    assert_eq!(rbits(0xA7, 4), 0x7);
    assert_eq!(b_short(0xFF, 0xD8), 0xFFD8);
}
