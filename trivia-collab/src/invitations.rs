use log::{debug, info};

use crate::{
    sessions::SessionManager, CollabContext, CollabError, CollabEvent, CollabResult,
    DatabaseResult, InvitationData, InvitationStatus, NewInvitation, PrimaryKey, UserData,
};

/// Manages invitations to quiz sessions
pub struct InvitationManager {
    context: CollabContext,
    sessions: SessionManager,
}

impl InvitationManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
            sessions: SessionManager::new(context),
        }
    }

    /// Invites a user to a session. If no session is given, the sender's newest pending
    /// invitation to the recipient is returned, or a new session is created for the sender.
    ///
    /// Sending the same invitation twice returns the pending one.
    pub async fn send(
        &self,
        user: &UserData,
        recipient_id: PrimaryKey,
        session_code: Option<String>,
    ) -> CollabResult<InvitationData> {
        let sender = self.context.database.user_by_id(user.id).await?;
        let recipient = self.context.database.user_by_id(recipient_id).await?;

        if sender.id == recipient.id {
            return Err(CollabError::validation("You can't invite yourself"));
        }

        let session_code = match session_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => code,
            None => {
                let newest = self
                    .context
                    .database
                    .pending_invitations_for(recipient.id)
                    .await?
                    .into_iter()
                    .find(|i| i.sender_id == sender.id);

                if let Some(invitation) = newest {
                    debug!("Reusing pending invitation {}", invitation.id);
                    return Ok(invitation);
                }

                self.sessions
                    .create_session(&sender.username, Default::default())
                    .await?
                    .code
            }
        };

        let existing = self
            .context
            .database
            .pending_invitation(sender.id, recipient.id, &session_code)
            .await
            .optional()?;

        if let Some(invitation) = existing {
            debug!("Invitation {} is already pending", invitation.id);
            return Ok(invitation);
        }

        let invitation = self
            .context
            .database
            .create_invitation(NewInvitation {
                sender_id: sender.id,
                recipient_id: recipient.id,
                session_code,
                sender_username: sender.username,
                recipient_username: recipient.username,
            })
            .await?;

        info!(
            "User {} invited {} to session {}",
            invitation.sender_username, invitation.recipient_username, invitation.session_code
        );

        self.context.channels.push(
            recipient.id,
            CollabEvent::GameInvitation {
                invitation: invitation.clone(),
            },
        );

        Ok(invitation)
    }

    /// Accepts an invitation, returning the code of the session to join
    pub async fn accept(&self, user: &UserData, invitation_id: PrimaryKey) -> CollabResult<String> {
        let invitation = self
            .transition(user, invitation_id, InvitationStatus::Accepted)
            .await?;

        self.context.channels.push(
            invitation.sender_id,
            CollabEvent::InvitationAccepted {
                invitation_id: invitation.id,
                session_code: invitation.session_code.clone(),
                recipient_id: invitation.recipient_id,
                recipient_username: invitation.recipient_username.clone(),
            },
        );

        Ok(invitation.session_code)
    }

    pub async fn decline(
        &self,
        user: &UserData,
        invitation_id: PrimaryKey,
    ) -> CollabResult<InvitationData> {
        let invitation = self
            .transition(user, invitation_id, InvitationStatus::Declined)
            .await?;

        self.context.channels.push(
            invitation.sender_id,
            CollabEvent::InvitationDeclined {
                invitation_id: invitation.id,
                recipient_id: invitation.recipient_id,
                recipient_username: invitation.recipient_username.clone(),
            },
        );

        Ok(invitation)
    }

    /// Lists pending invitations addressed to the user, newest first
    pub async fn list(&self, user: &UserData) -> CollabResult<Vec<InvitationData>> {
        Ok(self
            .context
            .database
            .pending_invitations_for(user.id)
            .await?)
    }

    /// Removes invitations that are past their time-to-live
    pub async fn purge_expired(&self) -> CollabResult<u64> {
        let removed = self.context.database.clear_expired_invitations().await?;

        if removed > 0 {
            info!("Purged {} expired invitations", removed);
        }

        Ok(removed)
    }

    async fn transition(
        &self,
        user: &UserData,
        invitation_id: PrimaryKey,
        status: InvitationStatus,
    ) -> CollabResult<InvitationData> {
        let invitation = self.context.database.invitation_by_id(invitation_id).await?;

        if invitation.recipient_id != user.id {
            return Err(CollabError::forbidden(
                "Only the recipient can respond to an invitation",
            ));
        }

        if invitation.status != InvitationStatus::Pending {
            return Err(CollabError::invalid_state(format!(
                "Invitation is already {}",
                invitation.status
            )));
        }

        // The store checks the status and time-to-live again, a concurrent response loses here
        let invitation = self
            .context
            .database
            .resolve_invitation(invitation_id, status)
            .await?
            .ok_or_else(|| CollabError::invalid_state("Invitation was already answered"))?;

        info!(
            "User {} {} invitation {}",
            user.username, status, invitation_id
        );

        Ok(invitation)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::{realtime::ConnectionHandle, test_util::*, Database};

    use super::*;

    #[tokio::test]
    async fn test_send_is_idempotent_per_session() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        let first = collab
            .invitations
            .send(&alice, bob.id, Some("ABC234".to_string()))
            .await
            .unwrap();
        let second = collab
            .invitations
            .send(&alice, bob.id, Some("ABC234".to_string()))
            .await
            .unwrap();
        let other = collab
            .invitations
            .send(&alice, bob.id, Some("XYZ789".to_string()))
            .await
            .unwrap();

        assert_eq!(first.id, second.id, "same triple returns the pending invitation");
        assert_ne!(first.id, other.id, "another session is another invitation");
        assert_eq!(first.sender_username, "alice");
        assert_eq!(first.recipient_username, "bob");

        let pending = collab.invitations.list(&bob).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, other.id, "newest first");
    }

    #[tokio::test]
    async fn test_send_without_session_creates_one() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        let invitation = collab.invitations.send(&alice, bob.id, None).await.unwrap();
        let session = collab
            .sessions
            .session(&invitation.session_code)
            .await
            .expect("session exists");

        assert_eq!(session.participants, vec!["alice".to_string()]);

        let retried = collab.invitations.send(&alice, bob.id, None).await.unwrap();
        assert_eq!(retried.id, invitation.id, "a retry reuses the pending invitation");
        assert_eq!(collab.invitations.list(&bob).await.unwrap().len(), 1);
        assert_eq!(
            collab.admin.list_sessions().await.unwrap().len(),
            1,
            "no extra session is created"
        );
    }

    #[tokio::test]
    async fn test_send_to_unknown_recipient() {
        let collab = collab();
        let alice = user(&collab, "alice").await;

        assert!(matches!(
            collab.invitations.send(&alice, 999, None).await,
            Err(CollabError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_accept_flow_and_guards() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;
        let carol = user(&collab, "carol").await;

        let (alice_handle, mut alice_receiver) = ConnectionHandle::new();
        let (bob_handle, mut bob_receiver) = ConnectionHandle::new();
        collab.context.channels.identify(alice.id, alice_handle);
        collab.context.channels.identify(bob.id, bob_handle);

        let invitation = collab
            .invitations
            .send(&alice, bob.id, Some("ABC234".to_string()))
            .await
            .unwrap();

        assert!(matches!(
            bob_receiver.try_recv(),
            Ok(CollabEvent::GameInvitation { .. })
        ));

        assert!(matches!(
            collab.invitations.accept(&carol, invitation.id).await,
            Err(CollabError::Forbidden(_))
        ));

        let code = collab.invitations.accept(&bob, invitation.id).await.unwrap();
        assert_eq!(code, "ABC234");

        assert!(matches!(
            alice_receiver.try_recv(),
            Ok(CollabEvent::InvitationAccepted { .. })
        ));

        assert!(
            matches!(
                collab.invitations.decline(&bob, invitation.id).await,
                Err(CollabError::InvalidState(_))
            ),
            "terminal invitations can't be acted on"
        );
        assert!(collab.invitations.list(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolved_invitations_stay_resolved() {
        let (collab, database) = collab_with_database();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        let invitation = collab
            .invitations
            .send(&alice, bob.id, Some("ABC234".to_string()))
            .await
            .unwrap();

        let accepted = database
            .resolve_invitation(invitation.id, InvitationStatus::Accepted)
            .await
            .unwrap();
        assert!(accepted.is_some());

        // A response that read the invitation while it was still pending
        let late = database
            .resolve_invitation(invitation.id, InvitationStatus::Declined)
            .await
            .unwrap();
        assert!(late.is_none(), "the second write does nothing");

        let stored = database.invitation_by_id(invitation.id).await.unwrap();
        assert_eq!(stored.status, InvitationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_push_failure_is_silent() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        let invitation = collab
            .invitations
            .send(&alice, bob.id, Some("ABC234".to_string()))
            .await
            .expect("sending works without a live connection");

        collab
            .invitations
            .decline(&bob, invitation.id)
            .await
            .expect("declining works without a live connection");
    }

    #[tokio::test]
    async fn test_expired_invitations() {
        let (collab, database) = collab_with_database();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        let invitation = collab
            .invitations
            .send(&alice, bob.id, Some("ABC234".to_string()))
            .await
            .unwrap();

        database.backdate_invitation(invitation.id, Duration::hours(2));

        assert!(collab.invitations.list(&bob).await.unwrap().is_empty());
        assert!(matches!(
            collab.invitations.accept(&bob, invitation.id).await,
            Err(CollabError::NotFound { .. })
        ));
        assert_eq!(collab.invitations.purge_expired().await.unwrap(), 1);
    }
}
