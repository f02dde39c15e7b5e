//! Drill-down state machine
//!
//! Explicit World/Loading/Country states with monotonically increasing
//! request tokens. Entering a country view requires both the zoom
//! animation and the geometry fetch to finish, in either order; outcomes
//! carrying a stale token are discarded, so when the user clicks a second
//! country before the first finished loading, the newest click wins.

use crate::geodata::GeodataError;
use crate::geometry::PolygonLayer;
use crate::palette::Rgb8;

/// The clicked country's payload, captured at click time.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub code: String,
    pub name: String,
    pub map_asset: String,
    pub fill: Rgb8,
}

enum State {
    World,
    Loading {
        token: u64,
        animation_done: bool,
        geometry: Option<PolygonLayer>,
    },
    Country,
}

/// What the UI must do after feeding an event into the state machine.
#[derive(Debug)]
pub enum Transition {
    /// Nothing visible changes yet
    None,
    /// Swap to the country layer, show the back control, pin minimum zoom
    EnterCountry {
        geometry: PolygonLayer,
        selection: Selection,
    },
    /// Return to the world view and surface the error
    Fail {
        name: String,
        error: GeodataError,
    },
}

pub struct DrillDown {
    state: State,
    next_token: u64,
    /// Last clicked country; set at click time, cleared by back()
    selection: Option<Selection>,
}

impl Default for DrillDown {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillDown {
    pub fn new() -> Self {
        Self {
            state: State::World,
            next_token: 0,
            selection: None,
        }
    }

    pub fn is_world(&self) -> bool {
        matches!(self.state, State::World)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, State::Loading { .. })
    }

    pub fn is_country(&self) -> bool {
        matches!(self.state, State::Country)
    }

    /// Token of the in-flight request, if any.
    pub fn loading_token(&self) -> Option<u64> {
        match self.state {
            State::Loading { token, .. } => Some(token),
            _ => None,
        }
    }

    /// The captured country, used by the home control.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Start a drill-down. Returns the token the fetch and the zoom
    /// animation must report back with. A begin while a previous request
    /// is still in flight simply supersedes it.
    pub fn begin(&mut self, selection: Selection) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        self.state = State::Loading {
            token,
            animation_done: false,
            geometry: None,
        };
        self.selection = Some(selection);
        token
    }

    fn is_current(&self, token: u64) -> bool {
        matches!(self.state, State::Loading { token: current, .. } if current == token)
    }

    /// The zoom animation for `token` finished.
    pub fn animation_finished(&mut self, token: u64) -> Transition {
        if !self.is_current(token) {
            return Transition::None;
        }
        if let State::Loading { animation_done, .. } = &mut self.state {
            *animation_done = true;
        }
        self.try_enter_country()
    }

    /// A fetch outcome for `token` arrived.
    pub fn geometry_arrived(
        &mut self,
        token: u64,
        result: Result<PolygonLayer, GeodataError>,
    ) -> Transition {
        if !self.is_current(token) {
            return Transition::None;
        }
        match result {
            Ok(layer) => {
                if let State::Loading { geometry, .. } = &mut self.state {
                    *geometry = Some(layer);
                }
                self.try_enter_country()
            }
            Err(error) => {
                self.state = State::World;
                let name = self
                    .selection
                    .take()
                    .map(|s| s.name)
                    .unwrap_or_else(|| "region".to_string());
                Transition::Fail { name, error }
            }
        }
    }

    /// Back control: return to the world view and forget the selection.
    pub fn back(&mut self) {
        self.state = State::World;
        self.selection = None;
    }

    fn try_enter_country(&mut self) -> Transition {
        let ready = matches!(
            self.state,
            State::Loading {
                animation_done: true,
                geometry: Some(_),
                ..
            }
        );
        if !ready {
            return Transition::None;
        }

        let geometry = match std::mem::replace(&mut self.state, State::Country) {
            State::Loading { geometry: Some(g), .. } => g,
            _ => unreachable!("checked above"),
        };

        let selection = self
            .selection
            .clone()
            .expect("selection is set for the whole Loading state");

        Transition::EnterCountry { geometry, selection }
    }
}
