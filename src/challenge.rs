// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//


//! Two-chord listening challenges and their evaluation.
//!
//! A challenge pairs two random chords with the same number of voices. The
//! user names the pitch class of every voice of the second chord, lowest to
//! highest, and is scored per row.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chords::Chord;
use crate::piano::{NoteName, PitchedNote};
use crate::voicing::{generate_random_chord, VoicingError};

#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error("unable to generate challenge: {0}")]
    Generation(#[from] VoicingError),

    #[error("no row with id '{0}'")]
    UnknownRow(String),

    #[error("chords have different voice counts ({first} and {second})")]
    MismatchedChords { first: usize, second: usize },
}

/// One answer row, covering the same voice position in both chords.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: String,
    pub title: String,
    pub chord1: PitchedNote,
    pub chord2: PitchedNote,
    #[serde(default)]
    pub selected_note: Option<NoteName>,
}

/// The outcome for a single row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowResult {
    pub id: String,
    pub is_correct: bool,
    pub user_answer: Option<NoteName>,
    /// Only set for wrong answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<NoteName>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub score: usize,
    pub total: usize,
    pub rows: Vec<RowResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordChallenge {
    pub chord1: Chord,
    pub chord2: Chord,
    pub is_polyphonic: bool,
    pub rows: Vec<Row>,
    #[serde(default)]
    pub result: Option<Evaluation>,
}

/// Creates a challenge from two random chords. The second chord is forced to
/// the first chord's voice count.
pub fn init_chord_challenge<R: Rng + ?Sized>(
    rng: &mut R,
    is_polyphonic: bool,
) -> Result<ChordChallenge, ChallengeError> {
    let chord1 = generate_random_chord(rng, is_polyphonic, None)?;
    let chord2 = generate_random_chord(rng, is_polyphonic, Some(chord1.pitched_notes.len()))?;
    let rows = generate_rows(&chord1, &chord2)?;

    info!(chord1 = %chord1, chord2 = %chord2, rows = rows.len(), "Created challenge");
    Ok(ChordChallenge {
        chord1,
        chord2,
        is_polyphonic,
        rows,
        result: None,
    })
}

/// Titles for each voice from lowest to highest.
pub fn generate_row_titles(chord: &Chord) -> Vec<String> {
    let len = chord.pitched_notes.len();
    let mut titles = vec!["Lowest note".to_string()];
    titles.extend((1..len.saturating_sub(1)).map(|i| format!("Middle note {:02}", i)));
    if len > 1 {
        titles.push("Highest note".to_string());
    }
    titles
}

/// Builds one row per voice, pairing the voices of both chords by position.
pub fn generate_rows(chord1: &Chord, chord2: &Chord) -> Result<Vec<Row>, ChallengeError> {
    if chord1.pitched_notes.len() != chord2.pitched_notes.len() {
        return Err(ChallengeError::MismatchedChords {
            first: chord1.pitched_notes.len(),
            second: chord2.pitched_notes.len(),
        });
    }

    Ok(generate_row_titles(chord1)
        .into_iter()
        .zip(chord1.pitched_notes.iter().zip(&chord2.pitched_notes))
        .enumerate()
        .map(|(i, (title, (&first, &second)))| Row {
            id: format!("ton0{}", i + 1),
            title,
            chord1: first,
            chord2: second,
            selected_note: None,
        })
        .collect())
}

/// Scores the user's answers by row id against the pitch classes of the
/// second chord. Missing answers count as wrong.
pub fn evaluate(user_input: &HashMap<String, NoteName>, challenge: &ChordChallenge) -> Evaluation {
    let rows: Vec<RowResult> = challenge
        .rows
        .iter()
        .map(|row| {
            let expected = row.chord2.note();
            let given = user_input.get(&row.id).copied();
            let is_correct = given == Some(expected);
            RowResult {
                id: row.id.clone(),
                is_correct,
                user_answer: given,
                correct_answer: (!is_correct).then_some(expected),
            }
        })
        .collect();

    Evaluation {
        score: rows.iter().filter(|row| row.is_correct).count(),
        total: challenge.rows.len(),
        rows,
    }
}

impl ChordChallenge {
    /// Records the user's choice for a row.
    pub fn select_note(&mut self, row_id: &str, note: NoteName) -> Result<(), ChallengeError> {
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.id == row_id)
            .ok_or_else(|| ChallengeError::UnknownRow(row_id.to_string()))?;
        row.selected_note = Some(note);
        Ok(())
    }

    /// Evaluates the selected notes and attaches the result.
    pub fn evaluate_selected(&mut self) -> &Evaluation {
        let user_input: HashMap<String, NoteName> = self
            .rows
            .iter()
            .filter_map(|row| row.selected_note.map(|note| (row.id.clone(), note)))
            .collect();
        let evaluation = evaluate(&user_input, self);
        self.result.insert(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::chords::ChordType;

    fn chord(notes: &[&str]) -> Chord {
        let pitched_notes: Vec<PitchedNote> = notes.iter().map(|n| n.parse().unwrap()).collect();
        Chord {
            root: pitched_notes[0].note(),
            chord_type: ChordType::Major,
            formula: ChordType::Major.formula().to_vec(),
            notes: pitched_notes.iter().map(|n| n.note()).collect(),
            pitched_notes,
            is_polyphonic: false,
        }
    }

    fn challenge() -> ChordChallenge {
        let chord1 = chord(&["C3", "E3", "G4"]);
        let chord2 = chord(&["D3", "F#4", "A4"]);
        let rows = generate_rows(&chord1, &chord2).unwrap();
        ChordChallenge {
            chord1,
            chord2,
            is_polyphonic: false,
            rows,
            result: None,
        }
    }

    #[test]
    fn test_row_titles() {
        assert_eq!(
            generate_row_titles(&chord(&["C3", "E3", "G3"])),
            vec!["Lowest note", "Middle note 01", "Highest note"]
        );
        assert_eq!(
            generate_row_titles(&chord(&["C3", "E3", "G3", "C4", "E4", "G4"])),
            vec![
                "Lowest note",
                "Middle note 01",
                "Middle note 02",
                "Middle note 03",
                "Middle note 04",
                "Highest note"
            ]
        );
    }

    #[test]
    fn test_rows_pair_voices() {
        let challenge = challenge();
        let ids: Vec<&str> = challenge.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ton01", "ton02", "ton03"]);
        assert_eq!(challenge.rows[1].chord1.to_string(), "E3");
        assert_eq!(challenge.rows[1].chord2.to_string(), "F#4");
        assert!(challenge.rows.iter().all(|r| r.selected_note.is_none()));
    }

    #[test]
    fn test_rows_mismatched() {
        let result = generate_rows(&chord(&["C3", "E3", "G3"]), &chord(&["C3", "E3"]));
        assert!(matches!(
            result,
            Err(ChallengeError::MismatchedChords {
                first: 3,
                second: 2
            })
        ));
    }

    #[test]
    fn test_evaluate() {
        let challenge = challenge();
        let user_input = HashMap::from([
            ("ton01".to_string(), NoteName::D),
            ("ton02".to_string(), NoteName::G),
        ]);

        let evaluation = evaluate(&user_input, &challenge);
        assert_eq!(evaluation.score, 1);
        assert_eq!(evaluation.total, 3);
        assert_eq!(
            evaluation.rows[0],
            RowResult {
                id: "ton01".to_string(),
                is_correct: true,
                user_answer: Some(NoteName::D),
                correct_answer: None,
            }
        );
        assert_eq!(evaluation.rows[1].correct_answer, Some(NoteName::FSharp));
        assert_eq!(evaluation.rows[2].user_answer, None);
        assert_eq!(evaluation.rows[2].correct_answer, Some(NoteName::A));
    }

    #[test]
    fn test_evaluate_strips_octave() {
        let mut challenge = challenge();
        challenge.rows[2].chord2 = "G4".parse().unwrap();
        let user_input = HashMap::from([("ton03".to_string(), NoteName::G)]);
        assert!(evaluate(&user_input, &challenge).rows[2].is_correct);
    }

    #[test]
    fn test_evaluate_selected() {
        let mut challenge = challenge();
        challenge.select_note("ton01", NoteName::D).unwrap();
        challenge.select_note("ton02", NoteName::FSharp).unwrap();
        challenge.select_note("ton03", NoteName::A).unwrap();
        assert!(matches!(
            challenge.select_note("ton09", NoteName::A),
            Err(ChallengeError::UnknownRow(_))
        ));

        let score = challenge.evaluate_selected().score;
        assert_eq!(score, 3);
        assert_eq!(challenge.result.as_ref().unwrap().total, 3);
    }

    #[test]
    fn test_init_chord_challenge() {
        let mut rng = StdRng::seed_from_u64(7);
        for is_polyphonic in [true, false] {
            let challenge = init_chord_challenge(&mut rng, is_polyphonic).unwrap();
            assert_eq!(
                challenge.chord1.pitched_notes.len(),
                challenge.chord2.pitched_notes.len()
            );
            assert_eq!(challenge.rows.len(), challenge.chord1.pitched_notes.len());
            assert_eq!(challenge.is_polyphonic, is_polyphonic);
            assert!(challenge.result.is_none());
        }
    }

    #[test]
    fn test_serde_shape() {
        let mut challenge = challenge();
        challenge.select_note("ton01", NoteName::CSharp).unwrap();
        challenge.evaluate_selected();

        let json = serde_json::to_value(&challenge).unwrap();
        assert_eq!(json["isPolyphonic"], false);
        assert_eq!(json["chord2"]["pitchedNotes"][1], "F#4");
        assert_eq!(json["chord1"]["type"], "major");
        assert_eq!(json["rows"][0]["selectedNote"], "C#");
        assert_eq!(json["result"]["rows"][0]["isCorrect"], false);
        assert_eq!(json["result"]["rows"][0]["correctAnswer"], "D");
        assert!(json["result"]["rows"][1]["userAnswer"].is_null());

        let parsed: ChordChallenge = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, challenge);
    }
}
