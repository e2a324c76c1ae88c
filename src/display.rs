use anyhow::{anyhow, Result};
use crossterm::{
    cursor::MoveTo,
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdout, Write};

use connect4_engine::{Position, HEIGHT, WIDTH};

/// Draws the board in colour below the cursor, column numbers on top
pub fn draw(position: &Position) -> Result<()> {
    let mut stdout = stdout();

    let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
    stdout.queue(PrintStyledContent(style(cols + "\n")))?;
    for _ in 0..HEIGHT {
        stdout.queue(PrintStyledContent(style("\n")))?;
    }
    stdout.flush()?;

    let origin = crossterm::cursor::position()?;
    // the top right tile is the furthest from the origin
    if tile_coordinates(origin, WIDTH - 1, HEIGHT - 1).is_none() {
        return Err(anyhow!("terminal too small to draw the board"));
    }

    for row in 0..HEIGHT {
        for column in 0..WIDTH {
            let tile = 1 << (column * (HEIGHT + 1) + row);
            let colour = if position.player_one_mask() & tile != 0 {
                Color::Red
            } else if position.player_two_mask() & tile != 0 {
                Color::Yellow
            } else {
                Color::DarkBlue
            };
            let (pos_x, pos_y) = tile_coordinates(origin, column, row)
                .ok_or_else(|| anyhow!("terminal too small to draw the board"))?;

            stdout.queue(MoveTo(pos_x, pos_y))?.queue(PrintStyledContent(
                style("O")
                    .attribute(Attribute::Bold)
                    .on(Color::DarkBlue)
                    .with(colour),
            ))?;
        }
    }
    stdout
        .queue(MoveTo(origin.0, origin.1))?
        .queue(PrintStyledContent(style("\n")))?;
    stdout.flush()?;
    Ok(())
}

// rows are drawn upwards from the line above the cursor
fn tile_coordinates(origin: (u16, u16), column: usize, row: usize) -> Option<(u16, u16)> {
    let (origin_x, origin_y) = origin;
    let x = origin_x.checked_add(column as u16)?;
    let y = origin_y.checked_sub(1 + row as u16)?;
    Some((x, y))
}

/// Prints the board as plain text, for terminals without cursor control
pub fn print_plain(position: &Position) {
    let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
    println!("{}\n{}\n", cols, position);
}
