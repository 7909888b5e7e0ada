use chip8_vm::{Chip8Interpreter, Cycle};
use proptest::prelude::*;

/// load `program` at 0x200 and run one cycle per instruction word
fn run(program: &[u8]) -> Chip8Interpreter {
    let mut m = Chip8Interpreter::with_seed(0);
    m.load(program).unwrap();
    for _ in 0..program.len() / 2 {
        m.step().unwrap();
    }
    m
}

proptest! {
    #[test]
    fn add_sets_carry(a in any::<u8>(), b in any::<u8>()) {
        // LD V1, a; LD V2, b; ADD V1, V2
        let m = run(&[0x61, a, 0x62, b, 0x81, 0x24]);
        let v = m.registers();
        prop_assert_eq!(v[1], a.wrapping_add(b));
        prop_assert_eq!(v[0xF], (a as u16 + b as u16 > 255) as u8);
    }

    #[test]
    fn sub_sets_no_borrow(a in any::<u8>(), b in any::<u8>()) {
        // LD V1, a; LD V2, b; SUB V1, V2
        let m = run(&[0x61, a, 0x62, b, 0x81, 0x25]);
        let v = m.registers();
        prop_assert_eq!(v[1], a.wrapping_sub(b));
        prop_assert_eq!(v[0xF], (a > b) as u8);
    }

    #[test]
    fn subn_sets_no_borrow(a in any::<u8>(), b in any::<u8>()) {
        // LD V1, a; LD V2, b; SUBN V1, V2
        let m = run(&[0x61, a, 0x62, b, 0x81, 0x27]);
        let v = m.registers();
        prop_assert_eq!(v[1], b.wrapping_sub(a));
        prop_assert_eq!(v[0xF], (b > a) as u8);
    }

    #[test]
    fn shifts_flag_the_lost_bit(a in any::<u8>(), same in any::<bool>()) {
        let y = if same { 0x10 } else { 0x20 };
        // LD V1, a; SHR V1, Vy
        let m = run(&[0x61, a, 0x81, y | 0x06]);
        prop_assert_eq!(m.registers()[1], a >> 1);
        prop_assert_eq!(m.registers()[0xF], a & 1);
        // LD V1, a; SHL V1, Vy
        let m = run(&[0x61, a, 0x81, y | 0x0e]);
        prop_assert_eq!(m.registers()[1], a << 1);
        prop_assert_eq!(m.registers()[0xF], a >> 7);
    }

    #[test]
    fn bcd_digits(a in any::<u8>()) {
        // LD V1, a; LD I, 0x300; LD B, V1
        let m = run(&[0x61, a, 0xa3, 0x00, 0xf1, 0x33]);
        let digits = &m.memory()[0x300..0x303];
        prop_assert_eq!(digits[0] as u16 * 100 + digits[1] as u16 * 10 + digits[2] as u16, a as u16);
        prop_assert!(digits.iter().all(|d| *d < 10));
    }

    #[test]
    fn drawing_twice_is_a_no_op(x in any::<u8>(), y in any::<u8>(), sprite in prop::collection::vec(any::<u8>(), 1..=15)) {
        let n = sprite.len() as u8;
        // LD V1, x; LD V2, y; LD I, 0x300; DRW V1, V2, n; DRW V1, V2, n
        // sprite at 0x300
        let mut program = vec![0x61, x, 0x62, y, 0xa3, 0x00, 0xd1, 0x20 | n, 0xd1, 0x20 | n];
        program.resize(0x100, 0);
        program.extend_from_slice(&sprite);
        let mut m = Chip8Interpreter::with_seed(0);
        m.load(&program).unwrap();
        for _ in 0..4 {
            m.step().unwrap();
        }
        let lit = sprite.iter().map(|row| row.count_ones()).sum::<u32>() as usize;
        prop_assert_eq!(m.framebuffer().pixels().iter().filter(|p| **p).count(), lit);
        prop_assert_eq!(m.registers()[0xF], 0);
        m.step().unwrap();
        prop_assert!(m.framebuffer().pixels().iter().all(|p| !*p));
        prop_assert_eq!(m.registers()[0xF], (lit > 0) as u8);
    }

    #[test]
    fn jump_ignores_prior_pc(nnn in 0u16..0x1000, skip in 0usize..8) {
        // NOPs of 6xkk before the jump
        let mut program = Vec::new();
        for _ in 0..skip {
            program.extend_from_slice(&[0x60, 0x00]);
        }
        program.extend_from_slice(&[0x10 | (nnn >> 8) as u8, nnn as u8]);
        let m = run(&program);
        prop_assert_eq!(m.program_counter(), nnn);
    }

    #[test]
    fn unknown_instructions_only_advance_pc(low in any::<u8>()) {
        prop_assume!(![0x07u8, 0x0a, 0x15, 0x18, 0x1e, 0x29, 0x33, 0x55, 0x65].contains(&low));
        let mut m = Chip8Interpreter::with_seed(0);
        m.load(&[0xf1, low]).unwrap();
        let before = *m.registers();
        let cycle = m.step().unwrap();
        prop_assert!(matches!(cycle, Cycle::Executed(_)));
        prop_assert_eq!(m.program_counter(), 0x202);
        prop_assert_eq!(m.registers(), &before);
        prop_assert_eq!(m.index(), 0);
    }
}
