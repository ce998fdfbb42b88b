/// Property-based tests for the game state machine using proptest
///
/// Random sequences of player and keeper actions, with random clock jumps,
/// are applied to a single game. Rejected actions must leave the game
/// untouched, and the card and chip invariants must hold after every step.
use chrono::{DateTime, Duration, TimeZone, Utc};
use peek_poker::{GameRules, GameStateMachine, Phase, PlayerId};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

#[derive(Clone, Debug)]
enum Step {
    Join(usize),
    Leave(usize),
    Start,
    Peek(usize),
    Swap(usize),
    EndPeek,
    Bet(usize, u32),
    Fold(usize),
    EndBetting,
    Cleanup,
    Wait(i64),
}

const NAMES: [&str; 7] = ["p0", "p1", "p2", "p3", "p4", "p5", "p6"];

fn player(i: usize) -> PlayerId {
    PlayerId::new(NAMES[i % NAMES.len()])
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..7).prop_map(Step::Join),
        (0usize..7).prop_map(Step::Leave),
        Just(Step::Start),
        (0usize..7).prop_map(Step::Peek),
        (0usize..7).prop_map(Step::Swap),
        Just(Step::EndPeek),
        (0usize..7, 0u32..30).prop_map(|(p, amount)| Step::Bet(p, amount)),
        (0usize..7).prop_map(Step::Fold),
        Just(Step::EndBetting),
        Just(Step::Cleanup),
        (1i64..90).prop_map(Step::Wait),
    ]
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()
}

fn apply(
    machine: &mut GameStateMachine,
    step: &Step,
    now: &mut DateTime<Utc>,
    rng: &mut StdRng,
) -> bool {
    let keeper = PlayerId::new("keeper");
    let result = match step {
        Step::Join(p) => machine.join(&player(*p), *now),
        Step::Leave(p) => machine.leave(&player(*p)).map(|_| ()),
        Step::Start => machine.start(&player(0), *now, rng),
        Step::Peek(p) => machine.peek(&player(*p), *now).map(|_| ()),
        Step::Swap(p) => machine.swap(&player(*p), *now, rng),
        Step::EndPeek => machine.end_peek_phase(&keeper, *now),
        Step::Bet(p, amount) => machine.bet(&player(*p), *amount, *now),
        Step::Fold(p) => machine.fold(&player(*p), *now),
        Step::EndBetting => machine.end_betting_phase(&keeper, *now),
        Step::Cleanup => machine.cleanup(&keeper).map(|_| ()),
        Step::Wait(secs) => {
            *now += Duration::seconds(*secs);
            Ok(())
        }
    };
    result.is_ok()
}

proptest! {
    #[test]
    fn test_invariants_hold_for_any_action_sequence(
        seed in any::<u64>(),
        steps in prop::collection::vec(step_strategy(), 1..80),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut now = t0();
        let mut machine = GameStateMachine::new(
            1,
            player(0),
            PlayerId::new("keeper"),
            GameRules::default(),
            now,
        );
        let mut phase = machine.game().phase;

        for step in &steps {
            let before = (
                machine.game().phase,
                machine.game().ledger.clone(),
                machine.game().assigned,
                machine.game().participants.clone(),
            );
            let accepted = apply(&mut machine, step, &mut now, &mut rng);
            let events = machine.drain_events();

            if !accepted {
                prop_assert!(events.is_empty(), "rejected {:?} emitted events", step);
                prop_assert_eq!(machine.game().phase, before.0);
                prop_assert_eq!(&machine.game().ledger, &before.1);
                prop_assert_eq!(machine.game().assigned, before.2);
                prop_assert_eq!(&machine.game().participants, &before.3);
            }

            prop_assert!(machine.game().phase >= phase, "phase went backwards");
            phase = machine.game().phase;
            prop_assert!(
                machine.check_invariants().is_ok(),
                "invariants broken after {:?}: {:?}",
                step,
                machine.check_invariants()
            );
        }
    }

    #[test]
    fn test_fees_and_pot_account_for_every_chip(
        seed in any::<u64>(),
        swappers in prop::collection::vec(any::<bool>(), 2..=5),
        bets in prop::collection::vec(5u32..=13, 5),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let start = t0();
        let mut machine =
            GameStateMachine::new(1, player(0), PlayerId::new("keeper"), GameRules::default(), start);
        for i in 1..swappers.len() {
            machine.join(&player(i), start).unwrap();
        }
        machine.start(&player(0), start, &mut rng).unwrap();

        let mut fees = 0;
        for (i, swaps) in swappers.iter().enumerate() {
            machine.peek(&player(i), start).unwrap();
            fees += 5;
            if *swaps {
                machine.swap(&player(i), start, &mut rng).unwrap();
                fees += 7;
            }
        }
        machine
            .end_peek_phase(&PlayerId::new("keeper"), start + Duration::seconds(60))
            .unwrap();

        let during = start + Duration::seconds(61);
        let mut table_bet = 0;
        let mut pot = 0;
        for (i, amount) in bets.iter().take(swappers.len()).enumerate() {
            let amount = (*amount).max(table_bet);
            if machine.bet(&player(i), amount, during).is_ok() {
                table_bet = amount;
                pot += amount;
            }
        }
        prop_assert_eq!(machine.game().ledger.pot(), pot);
        prop_assert_eq!(machine.game().ledger.fees_burned(), fees);

        machine
            .end_betting_phase(&PlayerId::new("keeper"), start + Duration::seconds(180))
            .unwrap();
        prop_assert_eq!(machine.game().phase, Phase::Ended);
        let total: u32 = machine.players().map(|(_, p)| p.chip_balance).sum();
        prop_assert_eq!(total + fees, 25 * swappers.len() as u32);
    }
}
