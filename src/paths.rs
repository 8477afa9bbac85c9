/*
 * wadboost - Doomworld /idgames archive client and mirror downloader.
 * Copyright (C) 2025  compiledkernel-idk and wadboost contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 */

//! Archive layout: games and the alphabetical level buckets.

use std::fmt;
use std::str::FromStr;

use crate::error::{WadboostError, WadboostResult};

/// Root of the archive tree on every mirror
pub const IDGAMES_ROOT: &str = "idgames/";

/// Games with their own `levels/<game>/` tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Game {
    Doom,
    Doom2,
    Hacx,
    Heretic,
    Hexen,
    Strife,
}

impl Game {
    pub const ALL: [Game; 6] = [
        Game::Doom,
        Game::Doom2,
        Game::Hacx,
        Game::Heretic,
        Game::Hexen,
        Game::Strife,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Game::Doom => "doom",
            Game::Doom2 => "doom2",
            Game::Hacx => "hacx",
            Game::Heretic => "heretic",
            Game::Hexen => "hexen",
            Game::Strife => "strife",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = WadboostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Game::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == wanted)
            .ok_or_else(|| WadboostError::UnknownGame(s.to_string()))
    }
}

/// One of the nine shards of a game's `levels/` directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Digits,
    AtoC,
    DtoF,
    GtoI,
    JtoL,
    MtoO,
    PtoR,
    StoU,
    VtoZ,
}

impl Bucket {
    pub const ALL: [Bucket; 9] = [
        Bucket::Digits,
        Bucket::AtoC,
        Bucket::DtoF,
        Bucket::GtoI,
        Bucket::JtoL,
        Bucket::MtoO,
        Bucket::PtoR,
        Bucket::StoU,
        Bucket::VtoZ,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Digits => "0-9",
            Bucket::AtoC => "a-c",
            Bucket::DtoF => "d-f",
            Bucket::GtoI => "g-i",
            Bucket::JtoL => "j-l",
            Bucket::MtoO => "m-o",
            Bucket::PtoR => "p-r",
            Bucket::StoU => "s-u",
            Bucket::VtoZ => "v-z",
        }
    }

    /// Bucket for a filename's first character, case-folded
    pub fn for_filename(filename: &str) -> Option<Bucket> {
        let first = filename.chars().next()?.to_ascii_lowercase();
        let bucket = match first {
            '0'..='9' => Bucket::Digits,
            'a'..='c' => Bucket::AtoC,
            'd'..='f' => Bucket::DtoF,
            'g'..='i' => Bucket::GtoI,
            'j'..='l' => Bucket::JtoL,
            'm'..='o' => Bucket::MtoO,
            'p'..='r' => Bucket::PtoR,
            's'..='u' => Bucket::StoU,
            'v'..='z' => Bucket::VtoZ,
            _ => return None,
        };
        Some(bucket)
    }

    /// `levels/<game>/<bucket>/`
    pub fn path(&self, game: Game) -> String {
        format!("levels/{}/{}/", game, self.as_str())
    }
}

/// Map a filename to the archive directory holding it.
pub fn resolve(filename: &str, game: Game) -> WadboostResult<String> {
    Bucket::for_filename(filename)
        .map(|bucket| bucket.path(game))
        .ok_or_else(|| WadboostError::InvalidFilename(filename.to_string()))
}

/// All nine level directories of a game
pub fn level_dirs(game: Game) -> Vec<String> {
    Bucket::ALL.iter().map(|b| b.path(game)).collect()
}
