// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Único papel autorizado a operar estoque e pedidos.
pub const MANAGER_ROLE: &str = "manager";

// Estrutura de dados ("claims") dentro do JWT. O token é emitido fora deste serviço.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,    // Subject (ID do usuário)
    pub role: String, // Papel atribuído pelo gate externo
    pub exp: usize,   // Expiration time
    pub iat: usize,   // Issued At
}

impl Claims {
    pub fn is_manager(&self) -> bool {
        self.role == MANAGER_ROLE
    }
}

/// Quem está chamando (já autorizado como gerente).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
}
