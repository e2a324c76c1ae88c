#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    use crate::rollout::{monte_carlo, random_playout};
    use crate::search::{INFINITY, WIN_SCORE};
    use crate::transposition_table::Entry;
    use crate::{
        parse_table, serialize_table, Cache, CanonicalKey, Player, Position, SearchConfig, Searcher, SharedTranspositionTable,
        HEIGHT, WIDTH,
    };

    fn tile(column: usize, row: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + row)
    }

    // every position of a few random games, starting position included
    fn random_game_positions(seed: u64, games: usize) -> Vec<Position> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut positions = vec![];
        for _ in 0..games {
            let mut position = Position::new();
            positions.push(position);
            while !position.is_terminal() {
                let moves: Vec<Position> = position.list_moves().map(|(_, next)| next).collect();
                position = moves[rng.random_range(0..moves.len())];
                positions.push(position);
            }
        }
        positions
    }

    // plain negamax without pruning or cache, horizon scored as 0
    fn minimax(position: &Position, depth: u8) -> i32 {
        if position.is_terminal() {
            return match position.winner() {
                Some(_) => -WIN_SCORE * (depth as i32 + 1),
                None => 0,
            };
        }
        if depth == 0 {
            return 0;
        }
        position
            .list_moves()
            .map(|(_, child)| -minimax(&child, depth - 1))
            .max()
            .unwrap_or(0)
    }

    #[test]
    pub fn empty_board() -> Result<()> {
        let position = Position::new();
        for column in 0..WIDTH {
            assert!(position.is_valid_move(column));
        }
        let columns: Vec<usize> = position.list_moves().map(|(column, _)| column).collect();
        assert_eq!(columns, (0..WIDTH).collect::<Vec<_>>());
        assert_eq!(position.side_to_move(), Player::One);
        assert!(!position.is_terminal());
        Ok(())
    }

    #[test]
    #[should_panic]
    pub fn column_out_of_range() {
        Position::new().is_valid_move(WIDTH);
    }

    #[test]
    #[should_panic]
    pub fn outcome_of_unfinished_game() {
        Position::from_moves("44").unwrap().outcome();
    }

    #[test]
    #[should_panic]
    pub fn move_into_full_column() {
        Position::from_moves("444444").unwrap().apply_move(3);
    }

    #[test]
    pub fn vertical_win() -> Result<()> {
        let mut position = Position::new();
        for &column in [3, 0, 3, 0, 3, 0].iter() {
            position = position.apply_move(column);
            assert!(!position.is_win_for_last_mover());
        }
        position = position.apply_move(3);

        assert!(position.is_win_for_last_mover());
        assert!(position.is_terminal());
        assert!(!position.is_draw());
        assert_eq!(position.winner(), Some(Player::One));
        assert_eq!(position.outcome(), 1);
        assert_eq!(position, Position::from_moves("4141414")?);
        Ok(())
    }

    #[test]
    pub fn horizontal_win_for_player_two() -> Result<()> {
        // player 2 holds columns 3 to 5 of the bottom row
        let position = Position::from_moves("1314757")?;
        assert!(!position.is_terminal());

        let position = position.apply_move(5);
        assert_eq!(position.winner(), Some(Player::Two));
        assert_eq!(position.outcome(), -1);
        Ok(())
    }

    #[test]
    pub fn diagonal_wins() -> Result<()> {
        // player 1 climbs from the bottom left, player 2 holds the supports
        let player_one = tile(0, 0) | tile(1, 1) | tile(2, 2) | tile(3, 3)
            | tile(4, 0) | tile(5, 0) | tile(6, 0);
        let player_two =
            tile(1, 0) | tile(2, 0) | tile(2, 1) | tile(3, 0) | tile(3, 1) | tile(3, 2);

        let position = Position::from_masks(player_one, player_two)?;
        assert_eq!(position.side_to_move(), Player::Two);
        assert!(position.is_win_for_last_mover());
        // the mirror image is a win on the other diagonal
        assert!(position.mirrored().is_win_for_last_mover());
        Ok(())
    }

    #[test]
    pub fn full_board_draw() -> Result<()> {
        // two-row stripes, alternating between columns
        let mut player_one = 0;
        let mut player_two = 0;
        for column in 0..WIDTH {
            for row in 0..HEIGHT {
                if (row / 2 + column) % 2 == 0 && (column, row) != (6, 5) {
                    player_one |= tile(column, row);
                } else {
                    player_two |= tile(column, row);
                }
            }
        }
        assert_eq!(player_one.count_ones(), 21);

        let position = Position::from_masks(player_one, player_two)?;
        assert_eq!(position.num_moves(), WIDTH * HEIGHT);
        assert_eq!(position.list_moves().count(), 0);
        assert!(position.is_draw());
        assert_eq!(position.outcome(), 0);
        assert_eq!(position.winner(), None);

        // swapping the players checks the other player's tiles for alignments too
        assert!(Position::from_masks(player_two, player_one)?.is_draw());
        Ok(())
    }

    #[test]
    pub fn invalid_move_strings() -> Result<()> {
        assert!(Position::from_moves("8").is_err());
        assert!(Position::from_moves("4x").is_err());
        assert!(Position::from_moves("1111111").is_err());
        // game over after the seventh move
        assert!(Position::from_moves("41414141").is_err());
        Ok(())
    }

    #[test]
    pub fn invalid_masks() -> Result<()> {
        assert!(Position::from_masks(tile(0, 0), tile(0, 0)).is_err());
        assert!(Position::from_masks(tile(0, 1), 0).is_err());
        assert!(Position::from_masks(0, tile(0, 0)).is_err());
        assert!(Position::from_masks(tile(0, 0) | tile(1, 0), 0).is_err());
        // sentinel bit
        assert!(Position::from_masks(tile(0, HEIGHT), 0).is_err());
        Ok(())
    }

    #[test]
    pub fn invariants_hold_during_random_games() -> Result<()> {
        let positions = random_game_positions(0x00c0_ffee, 50);
        let mut moves_played = 0;

        for position in positions {
            if position.num_moves() == 0 {
                moves_played = 0;
            }
            assert_eq!(position.player_one_mask() & position.player_two_mask(), 0);
            assert_eq!(
                (position.player_one_mask().count_ones() + position.player_two_mask().count_ones())
                    as usize,
                moves_played
            );

            let open_columns = (0..WIDTH).filter(|&c| position.height(c) < HEIGHT).count();
            assert_eq!(position.list_moves().count(), open_columns);
            for (column, next) in position.list_moves() {
                assert_eq!(next.height(column), position.height(column) + 1);
                assert_eq!(next.side_to_move(), position.side_to_move().opponent());
            }

            // masks alone are enough to rebuild the position
            let rebuilt = Position::from_masks(position.player_one_mask(), position.player_two_mask())?;
            assert_eq!(rebuilt, position);

            assert_eq!(position.is_draw(), position.is_full() && !position.is_win_for_last_mover());
            moves_played += 1;
        }
        Ok(())
    }

    #[test]
    pub fn canonical_keys() -> Result<()> {
        for position in random_game_positions(7, 20) {
            let key = CanonicalKey::of(&position);
            assert_eq!(key.canonicalize(), key);
            assert_eq!(CanonicalKey::of(&position.mirrored()), key);
        }

        assert_eq!(
            CanonicalKey::of(&Position::from_moves("1")?),
            CanonicalKey::of(&Position::from_moves("7")?)
        );
        // same masks per player after mirroring one of them, but different positions
        assert_ne!(
            CanonicalKey::of(&Position::from_moves("12")?),
            CanonicalKey::of(&Position::from_moves("16")?)
        );
        Ok(())
    }

    #[test]
    pub fn playouts_reach_the_end() -> Result<()> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        for _ in 0..100 {
            let end = random_playout(&Position::from_moves("4453")?, &mut rng);
            assert!(end.is_terminal());
            assert!(end.num_moves() > 4);
        }
        Ok(())
    }

    #[test]
    pub fn monte_carlo_estimates() -> Result<()> {
        // an immediate win makes every playout of that move a win
        let threat = Position::from_moves("141414")?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert_eq!(monte_carlo(&threat, 10, &mut rng), 1);

        // no playouts, no information
        assert_eq!(monte_carlo(&Position::new(), 0, &mut rng), 0);

        // a fixed seed gives a fixed estimate
        let position = Position::from_moves("4453")?;
        let first = monte_carlo(&position, 25, &mut Xoshiro256PlusPlus::seed_from_u64(99));
        let second = monte_carlo(&position, 25, &mut Xoshiro256PlusPlus::seed_from_u64(99));
        assert_eq!(first, second);
        assert!([-1, 0, 1].contains(&first));
        Ok(())
    }

    #[test]
    pub fn finds_immediate_win() -> Result<()> {
        let position = Position::from_moves("414141")?;
        let mut searcher = Searcher::with_seed(SearchConfig { depth: 3, playouts: 10 }, 5);
        let decision = searcher.make_best_move(&position).unwrap();

        assert_eq!(decision.column, 3);
        assert!(decision.score >= WIN_SCORE);
        assert!(decision.position.is_win_for_last_mover());
        Ok(())
    }

    #[test]
    pub fn blocks_immediate_threat() -> Result<()> {
        // player 2 has three tiles stacked in column 4
        let position = Position::from_moves("147464")?;
        let mut searcher = Searcher::with_seed(SearchConfig { depth: 2, playouts: 10 }, 5);
        let decision = searcher.make_best_move(&position).unwrap();

        assert_eq!(decision.column, 3);
        Ok(())
    }

    #[test]
    pub fn finished_games_have_no_move() -> Result<()> {
        let mut searcher = Searcher::with_seed(SearchConfig::default(), 0);
        assert!(searcher.make_best_move(&Position::from_moves("4141414")?).is_none());
        Ok(())
    }

    #[test]
    pub fn matches_plain_minimax() -> Result<()> {
        let config = SearchConfig { depth: 4, playouts: 0 };
        for position in random_game_positions(42, 6).into_iter().step_by(3) {
            let mut searcher = Searcher::with_seed(config, 0);
            let score = searcher.search(&position, 4, -INFINITY, INFINITY);
            assert_eq!(score, minimax(&position, 4), "position:\n{}", position);
        }
        Ok(())
    }

    #[test]
    pub fn window_results_are_bounds() -> Result<()> {
        let config = SearchConfig { depth: 4, playouts: 0 };
        for position in random_game_positions(8, 4).into_iter().step_by(2) {
            let exact = minimax(&position, 4);

            let low = Searcher::with_seed(config, 0).search(&position, 4, exact - 1, exact + 1);
            assert_eq!(low, exact);

            // fail high: at least beta
            let high = Searcher::with_seed(config, 0).search(&position, 4, exact - 2, exact - 1);
            assert!(high >= exact - 1 && high <= exact);

            // fail low: at most alpha
            let fail_low = Searcher::with_seed(config, 0).search(&position, 4, exact + 1, exact + 2);
            assert!(fail_low <= exact + 1 && fail_low >= exact);
        }
        Ok(())
    }

    #[test]
    pub fn warm_cache_is_stable() -> Result<()> {
        let config = SearchConfig { depth: 2, playouts: 30 };
        let position = Position::from_moves("4453")?;

        let mut searcher = Searcher::with_seed(config, 11);
        let cold = searcher.search(&position, 2, -INFINITY, INFINITY);
        let nodes = searcher.node_count;

        let warm = searcher.search(&position, 2, -INFINITY, INFINITY);
        assert_eq!(warm, cold);
        // answered by the root entry
        assert_eq!(searcher.node_count, nodes + 1);

        // the mirror image shares the entry
        let mirrored = searcher.search(&position.mirrored(), 2, -INFINITY, INFINITY);
        assert_eq!(mirrored, cold);

        let mut fresh = Searcher::with_seed(config, 11);
        assert_eq!(fresh.search(&position, 2, -INFINITY, INFINITY), cold);
        Ok(())
    }

    #[test]
    pub fn seeded_values_replace_playouts() -> Result<()> {
        // column 5 is excellent for player 1, so is its mirror column 3
        let child = Position::new().apply_move(4);
        let seed_cache = |searcher: &mut Searcher| {
            searcher
                .cache_mut()
                .set(CanonicalKey::of(&child), Entry::seeded(-5 * WIN_SCORE));
        };

        // candidates are horizon positions
        let mut searcher = Searcher::with_seed(SearchConfig { depth: 0, playouts: 5 }, 2);
        seed_cache(&mut searcher);
        let decision = searcher.make_best_move(&Position::new()).unwrap();
        assert_eq!(decision.column, 2);
        assert_eq!(decision.score, 5 * WIN_SCORE);

        // with depth remaining the candidates are searched instead
        let mut searcher = Searcher::with_seed(SearchConfig { depth: 1, playouts: 5 }, 2);
        seed_cache(&mut searcher);
        let decision = searcher.make_best_move(&Position::new()).unwrap();
        assert!(decision.score.abs() <= 1);
        Ok(())
    }

    #[test]
    pub fn reloaded_table_still_blocks_threat() -> Result<()> {
        let config = SearchConfig { depth: 1, playouts: 10 };
        let mut first = Searcher::with_seed(config, 3);
        first.make_best_move(&Position::from_moves("14746")?);

        let loaded = parse_table(&serialize_table(first.cache()))?;
        assert!(!loaded.is_empty());
        assert!(loaded.iter().all(|(_, entry)| entry.depth == 0));

        // player 2 has three tiles stacked in column 4
        let position = Position::from_moves("147464")?;
        let mut second =
            Searcher::with_cache_and_seed(SearchConfig { depth: 2, playouts: 10 }, loaded, 3);
        let decision = second.make_best_move(&position).unwrap();

        assert_eq!(decision.column, 3);
        Ok(())
    }

    #[test]
    pub fn parallel_search_finds_immediate_win() -> Result<()> {
        let position = Position::from_moves("141414")?;
        let mut searcher = Searcher::with_cache_and_seed(
            SearchConfig { depth: 2, playouts: 10 },
            SharedTranspositionTable::new(),
            9,
        );
        let decision = searcher.make_best_move_parallel(&position).unwrap();

        assert_eq!(decision.column, 0);
        assert!(decision.score >= WIN_SCORE);
        assert!(searcher.node_count > 0);

        let table = searcher.cache().to_table();
        assert!(!table.is_empty());
        assert_eq!(table.len(), searcher.cache().len());
        Ok(())
    }
}
