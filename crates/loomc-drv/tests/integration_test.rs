//! Golden end-to-end scenario tests (§8 S1, S2): drive `Session::run` the
//! same way `faxc-drv/tests/integration_test.rs` drives `Session::compile`,
//! asserting on the shape of the final `ImpFunction` rather than on LIR
//! instructions.

use loomc_drv::{Config, Session};
use loomc_imp::ImpInstr;
use loomc_util::ScopeStack;

#[test]
fn s1_simple_tensor_double_lowers_to_a_single_for_loop() {
    let mut scope = ScopeStack::new();
    let (ans_ty, block) = loomc_drv::scenarios::s1(&mut scope);

    let session = Session::new(Config::default());
    let output = session.run(&ans_ty, &block).expect("pipeline should succeed");

    let has_for = output.imp.body.decls.iter().any(|d| matches!(d.instr, ImpInstr::IFor { .. }));
    assert!(has_for, "S1 should lower to an imperative for-loop over Fin 4, got {:#?}", output.imp);

    assert!(
        output.imp.body.decls.iter().all(|d| !matches!(d.instr, ImpInstr::Alloc { .. })),
        "the doubled table has no intermediate allocation beyond the answer destination"
    );
}

#[test]
fn s2_nested_for_threads_one_destination_through_both_loops() {
    let mut scope = ScopeStack::new();
    let (ans_ty, block) = loomc_drv::scenarios::s2(&mut scope);

    let session = Session::new(Config::default());
    let output = session.run(&ans_ty, &block).expect("pipeline should succeed");

    fn count_ifor(decls: &[loomc_imp::ImpDecl]) -> usize {
        decls
            .iter()
            .map(|d| match &d.instr {
                ImpInstr::IFor { body, .. } => 1 + count_ifor(&body.decls),
                _ => 0,
            })
            .sum()
    }
    assert_eq!(count_ifor(&output.imp.body.decls), 2, "S2 nests exactly two for-loops, got {:#?}", output.imp);
}

/// S3 only needs to be driven through loop lowering, not all the way to
/// Imp: the question this scenario answers is whether the synthesized
/// destination threads a `DepPair` leaf-before-leaf, which is settled once
/// `lower_fully_sequential` has run (Imp's best-effort `Place` decomposition
/// of a `DepPair` destination is a separate, already-documented gap, covered
/// directly against `make_dest` in `loomc-dest`).
#[test]
fn s3_dep_pair_result_allocates_one_pointer_per_leaf() {
    let mut scope = ScopeStack::new();
    let (ans_ty, block) = loomc_drv::scenarios::s3(&mut scope);

    let mut builder = loomc_lower::Builder::new();
    let (_dest_block, pointers) = loomc_lower::lower_fully_sequential(&mut builder, &ans_ty, &block).unwrap();

    assert_eq!(pointers.len(), 2, "one pointer for the index leaf, one for the payload leaf, both preallocated up front");
}

#[test]
fn vectorization_stage_is_a_no_op_when_there_is_no_top_level_seq() {
    let mut scope = ScopeStack::new();
    let (ans_ty, block) = loomc_drv::scenarios::s1(&mut scope);

    let session = Session::new(Config::default());
    let output = session.run(&ans_ty, &block).expect("pipeline should succeed");

    assert_eq!(output.vectorized_seqs, 0, "S1 lowers to a For, not a top-level Seq, so the vectorize pass has nothing to rewrite");
}
