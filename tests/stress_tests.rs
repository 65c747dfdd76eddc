//! Longer-running workloads: deep loops, call nesting near the stack limit,
//! and heap churn.

use neptune_spec::MemoryMap;
use neptune_vm::{RuntimeError, System};

#[test]
fn long_countdown_terminates() {
    let mut system = System::new(MemoryMap::neptune());
    system
        .load_program(
            "MOVI r1, 100000\n\
             loop: SUBI r1, 1\n\
             JNZ loop\n\
             HLT",
        )
        .unwrap();
    system.run().unwrap();
    assert_eq!(system.cpu().register(1).unwrap(), 0);
}

#[test]
fn recursion_overruns_the_stack_into_the_heap() {
    let mut system = System::new(MemoryMap::neptune());
    // CALL forever; each call pushes a word until the stack meets HP.
    system
        .load_program("down: CALL down")
        .unwrap();

    let err = loop {
        match system.step() {
            Ok(()) => {}
            Err(err) => break err,
        }
    };
    assert!(matches!(err, RuntimeError::HeapStackCollision { .. }));
    assert!(system.cpu().sp() <= system.cpu().hp() + 4);
}

#[test]
fn fibonacci_via_memory() {
    let mut system = System::new(MemoryMap::neptune());
    // Iterative fib(20) in r1, spilling pairs through RAM.
    system
        .load_program(
            "MOVI r1, 0\n\
             MOVI r2, 1\n\
             MOVI r4, 20\n\
             step: MOV r3, r2\n\
             ADD r2, r1\n\
             MOV r1, r3\n\
             SUBI r4, 1\n\
             JNZ step\n\
             STORI r1, 0x6000\n\
             HLT",
        )
        .unwrap();
    system.run().unwrap();
    assert_eq!(system.cpu().register(1).unwrap(), 6765);
    assert_eq!(system.cpu().bus().read_word(0x6000).unwrap(), 6765);
}

#[test]
fn heap_churn_fills_predictably() {
    let mut system = System::new(MemoryMap::neptune());
    let cpu = system.cpu_mut();
    let heap_base = cpu.memory_map().heap_base;

    for i in 0..1000u32 {
        let addr = cpu.allocate_heap(16).unwrap();
        assert_eq!(addr, heap_base + i * 16);
    }
    assert_eq!(cpu.hp(), heap_base + 16_000);
}
