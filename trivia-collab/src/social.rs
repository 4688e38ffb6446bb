use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::info;

use crate::{
    CollabContext, CollabError, CollabEvent, CollabResult, DatabaseResult, FriendshipData,
    FriendshipStatus, NewFriendship, PrimaryKey, UserData,
};

/// Manages friendships and friend requests
pub struct SocialManager {
    context: CollabContext,
}

/// An accepted friendship, seen from one side
#[derive(Debug, Clone)]
pub struct Friend {
    pub friendship_id: PrimaryKey,
    pub user_id: PrimaryKey,
    pub username: String,
    pub online: bool,
}

/// A pending friendship, seen from one side
#[derive(Debug, Clone)]
pub struct FriendRequest {
    pub request_id: PrimaryKey,
    /// The user on the other side of the request
    pub user_id: PrimaryKey,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct FriendsOverview {
    pub friends: Vec<Friend>,
    pub sent_requests: Vec<FriendRequest>,
    pub received_requests: Vec<FriendRequest>,
}

impl SocialManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Lists the friends and pending requests of a user.
    /// Edges pointing to users that no longer exist are skipped.
    pub async fn list_friends(&self, user: &UserData) -> CollabResult<FriendsOverview> {
        let edges = self.context.database.friendships_of(user.id).await?;

        let other_ids: Vec<_> = edges.iter().map(|e| e.other_side(user.id)).collect();
        let usernames: HashMap<_, _> = self
            .context
            .database
            .users_by_ids(&other_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let mut overview = FriendsOverview::default();

        for edge in edges {
            let other_id = edge.other_side(user.id);
            let Some(username) = usernames.get(&other_id).cloned() else {
                continue;
            };

            match edge.status {
                FriendshipStatus::Accepted => overview.friends.push(Friend {
                    friendship_id: edge.id,
                    user_id: other_id,
                    username,
                    online: self.context.channels.is_online(other_id),
                }),
                FriendshipStatus::Pending => {
                    let request = FriendRequest {
                        request_id: edge.id,
                        user_id: other_id,
                        username,
                        created_at: edge.created_at,
                    };

                    if edge.user1 == user.id {
                        overview.sent_requests.push(request)
                    } else {
                        overview.received_requests.push(request)
                    }
                }
                FriendshipStatus::Declined => {}
            }
        }

        Ok(overview)
    }

    /// Sends a friend request to the user with the given username
    pub async fn invite(
        &self,
        user: &UserData,
        target_username: &str,
    ) -> CollabResult<FriendshipData> {
        let target = self
            .context
            .database
            .user_by_username(target_username)
            .await?;

        if target.id == user.id {
            return Err(CollabError::validation(
                "You can't send a friend request to yourself",
            ));
        }

        let forward = self
            .context
            .database
            .friendship_by_pair(user.id, target.id)
            .await
            .optional()?;
        let reverse = self
            .context
            .database
            .friendship_by_pair(target.id, user.id)
            .await
            .optional()?;

        let already_friends = [&forward, &reverse]
            .into_iter()
            .flatten()
            .any(|edge| edge.status == FriendshipStatus::Accepted);

        if already_friends {
            return Err(CollabError::conflict(format!(
                "You are already friends with {}",
                target.username
            )));
        }

        match &reverse {
            Some(edge) if edge.status == FriendshipStatus::Pending => {
                return Err(CollabError::conflict(format!(
                    "{} already sent you a friend request",
                    target.username
                )));
            }
            // Only one edge may exist per pair, a stale reverse one gives way
            Some(edge) => self.context.database.delete_friendship(edge.id).await?,
            None => {}
        }

        let request = match forward {
            Some(edge) if edge.status == FriendshipStatus::Pending => {
                return Err(CollabError::conflict(format!(
                    "A friend request to {} is already pending",
                    target.username
                )));
            }
            // The store only holds one edge per ordered pair, so a stale one is reopened
            Some(edge) => {
                self.context
                    .database
                    .update_friendship_status(edge.id, FriendshipStatus::Pending)
                    .await?
            }
            None => {
                self.context
                    .database
                    .create_friendship(NewFriendship {
                        user1: user.id,
                        user2: target.id,
                    })
                    .await?
            }
        };

        info!(
            "User {} sent a friend request to {}",
            user.username, target.username
        );

        self.context.channels.push(
            target.id,
            CollabEvent::FriendRequest {
                request_id: request.id,
                from_id: user.id,
                from_username: user.username.clone(),
            },
        );

        Ok(request)
    }

    /// Accepts a friend request addressed to the user
    pub async fn accept(
        &self,
        user: &UserData,
        request_id: PrimaryKey,
    ) -> CollabResult<FriendshipData> {
        let request = self.context.database.friendship_by_id(request_id).await?;

        if request.user2 != user.id {
            return Err(CollabError::forbidden(
                "Only the recipient can accept a friend request",
            ));
        }

        let friendship = self
            .context
            .database
            .update_friendship_status(request_id, FriendshipStatus::Accepted)
            .await?;

        info!("User {} accepted friend request {}", user.username, request_id);
        Ok(friendship)
    }

    /// Declines or cancels a friend request, deleting it
    pub async fn decline(&self, user: &UserData, request_id: PrimaryKey) -> CollabResult<()> {
        self.delete_edge(user, request_id).await
    }

    /// Removes a friendship regardless of its status
    pub async fn remove(&self, user: &UserData, friendship_id: PrimaryKey) -> CollabResult<()> {
        self.delete_edge(user, friendship_id).await
    }

    async fn delete_edge(&self, user: &UserData, friendship_id: PrimaryKey) -> CollabResult<()> {
        let edge = self.context.database.friendship_by_id(friendship_id).await?;

        if !edge.involves(user.id) {
            return Err(CollabError::forbidden("You are not part of this friendship"));
        }

        self.context.database.delete_friendship(friendship_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{realtime::ConnectionHandle, test_util::*};

    use super::*;

    #[tokio::test]
    async fn test_request_accept_flow() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        let request = collab.social.invite(&alice, "bob").await.unwrap();

        let alice_view = collab.social.list_friends(&alice).await.unwrap();
        let bob_view = collab.social.list_friends(&bob).await.unwrap();

        assert_eq!(alice_view.sent_requests.len(), 1);
        assert_eq!(alice_view.sent_requests[0].username, "bob");
        assert_eq!(bob_view.received_requests.len(), 1);
        assert_eq!(bob_view.received_requests[0].username, "alice");

        assert!(
            matches!(
                collab.social.accept(&alice, request.id).await,
                Err(CollabError::Forbidden(_))
            ),
            "sender can't accept their own request"
        );

        collab.social.accept(&bob, request.id).await.unwrap();

        let alice_view = collab.social.list_friends(&alice).await.unwrap();
        let bob_view = collab.social.list_friends(&bob).await.unwrap();

        assert_eq!(alice_view.friends[0].username, "bob");
        assert_eq!(bob_view.friends[0].username, "alice");
        assert!(alice_view.sent_requests.is_empty());
        assert!(bob_view.received_requests.is_empty());
    }

    #[tokio::test]
    async fn test_invite_guards() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        assert!(matches!(
            collab.social.invite(&alice, "nobody").await,
            Err(CollabError::NotFound { .. })
        ));
        assert!(matches!(
            collab.social.invite(&alice, "alice").await,
            Err(CollabError::Validation(_))
        ));

        let request = collab.social.invite(&alice, "bob").await.unwrap();

        assert!(
            matches!(
                collab.social.invite(&alice, "bob").await,
                Err(CollabError::Conflict(_))
            ),
            "duplicate pending request"
        );

        collab.social.accept(&bob, request.id).await.unwrap();

        assert!(
            matches!(
                collab.social.invite(&bob, "alice").await,
                Err(CollabError::Conflict(_))
            ),
            "reverse direction of an accepted friendship"
        );
    }

    #[tokio::test]
    async fn test_crossed_requests_keep_one_edge() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        let request = collab.social.invite(&alice, "bob").await.unwrap();

        assert!(
            matches!(
                collab.social.invite(&bob, "alice").await,
                Err(CollabError::Conflict(_))
            ),
            "a pending request the other way blocks a second edge"
        );

        let edges = collab
            .context
            .database
            .friendships_of(alice.id)
            .await
            .unwrap();
        assert_eq!(edges.len(), 1, "one edge for the pair");

        collab.social.accept(&bob, request.id).await.unwrap();

        let view = collab.social.list_friends(&alice).await.unwrap();
        assert_eq!(view.friends.len(), 1, "bob is listed once");
    }

    #[tokio::test]
    async fn test_decline_and_remove() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;
        let carol = user(&collab, "carol").await;

        let request = collab.social.invite(&alice, "bob").await.unwrap();

        assert!(matches!(
            collab.social.decline(&carol, request.id).await,
            Err(CollabError::Forbidden(_))
        ));

        // The sender cancelling uses the same path
        collab.social.decline(&alice, request.id).await.unwrap();

        assert!(matches!(
            collab.social.decline(&alice, request.id).await,
            Err(CollabError::NotFound { .. })
        ));

        let request = collab.social.invite(&alice, "bob").await.unwrap();
        collab.social.accept(&bob, request.id).await.unwrap();
        collab.social.remove(&bob, request.id).await.unwrap();

        let view = collab.social.list_friends(&alice).await.unwrap();
        assert!(view.friends.is_empty(), "friendship is gone");
    }

    #[tokio::test]
    async fn test_online_comes_from_registry_and_requests_are_pushed() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        let (handle, mut receiver) = ConnectionHandle::new();
        collab.context.channels.identify(bob.id, handle);

        let request = collab.social.invite(&alice, "bob").await.unwrap();

        assert!(matches!(
            receiver.try_recv(),
            Ok(CollabEvent::FriendRequest { from_id, .. }) if from_id == alice.id
        ));

        collab.social.accept(&bob, request.id).await.unwrap();

        let view = collab.social.list_friends(&alice).await.unwrap();
        assert!(view.friends[0].online, "bob is connected");

        let view = collab.social.list_friends(&bob).await.unwrap();
        assert!(!view.friends[0].online, "alice is not connected");
    }

    #[tokio::test]
    async fn test_missing_users_are_skipped() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        collab.social.invite(&alice, "bob").await.unwrap();
        collab.context.database.delete_user(bob.id).await.unwrap();

        let view = collab.social.list_friends(&alice).await.unwrap();
        assert!(view.sent_requests.is_empty());
    }
}
